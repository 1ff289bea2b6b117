/// How a dialog was closed without pressing either action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    Backdrop,
    Escape,
}

/// Which exit an interaction took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogExit {
    Confirmed,
    Cancelled,
}

/// ConfirmDialog
///
/// A modal that blocks an action until the user confirms it. Each time the
/// dialog is opened exactly one of `on_confirm` and `on_cancel` fires; backdrop
/// clicks and Escape count as cancelling. While `loading`, every exit is ignored
/// so a slow confirm cannot be submitted twice.
pub struct ConfirmDialog {
    open: bool,
    loading: bool,
    destructive: bool,
    on_confirm: Box<dyn FnMut() + Send>,
    on_cancel: Box<dyn FnMut() + Send>,
}

impl ConfirmDialog {
    pub fn new(
        on_confirm: impl FnMut() + Send + 'static,
        on_cancel: impl FnMut() + Send + 'static,
    ) -> Self {
        Self {
            open: false,
            loading: false,
            destructive: false,
            on_confirm: Box::new(on_confirm),
            on_cancel: Box::new(on_cancel),
        }
    }

    /// Marks the dialog as destructive. Only changes how it is styled.
    pub fn destructive(mut self, destructive: bool) -> Self {
        self.destructive = destructive;
        self
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_destructive(&self) -> bool {
        self.destructive
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn confirm(&mut self) -> Option<DialogExit> {
        self.exit(DialogExit::Confirmed)
    }

    pub fn cancel(&mut self) -> Option<DialogExit> {
        self.exit(DialogExit::Cancelled)
    }

    pub fn dismiss(&mut self, reason: DismissReason) -> Option<DialogExit> {
        tracing::trace!(?reason, "confirm dialog dismissed");
        self.cancel()
    }

    fn exit(&mut self, exit: DialogExit) -> Option<DialogExit> {
        if !self.open || self.loading {
            return None;
        }
        self.open = false;
        match exit {
            DialogExit::Confirmed => (self.on_confirm)(),
            DialogExit::Cancelled => (self.on_cancel)(),
        }
        Some(exit)
    }
}

impl std::fmt::Debug for ConfirmDialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmDialog")
            .field("open", &self.open)
            .field("loading", &self.loading)
            .field("destructive", &self.destructive)
            .finish_non_exhaustive()
    }
}
