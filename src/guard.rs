use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle};

use crate::{
    config::AppConfig,
    edge::{DASHBOARD_PATH, SIGN_IN_PATH},
    identity::{IdentityState, resolve_identity, resolve_role},
    models::{AllowList, Role, UserIdentity},
};

/// Outcome of a single authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Authorize,
    Redirect(&'static str),
}

/// authorize
///
/// The role check shared by the client guard and the server-side role gate.
/// No identity sends the visitor to sign in; a role outside the allow-list
/// is quietly narrowed back to the generic dashboard.
pub fn authorize(identity: Option<&UserIdentity>, allowed: &AllowList) -> GuardDecision {
    match identity {
        None => GuardDecision::Redirect(SIGN_IN_PATH),
        Some(user) if !allowed.contains(user.role) => GuardDecision::Redirect(DASHBOARD_PATH),
        Some(_) => GuardDecision::Authorize,
    }
}

/// Navigation primitive injected by the host shell.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

pub type NavigatorState = Arc<dyn Navigator>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authorized,
    Redirecting { to: &'static str },
}

/// What the guard lets the host render at this moment.
#[derive(Debug, PartialEq, Eq)]
pub enum View<'a, T: ?Sized> {
    Children(&'a T),
    Fallback(&'a T),
    Loading,
    Nothing,
}

#[derive(Debug, Clone, Default)]
pub struct GuardOptions {
    /// Upper bound on waiting for session hydration. Hitting it counts as signed out.
    pub hydration_timeout: Option<Duration>,
}

impl From<&AppConfig> for GuardOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            hydration_timeout: config.hydration_timeout,
        }
    }
}

// The dependency set a completed check was made against.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Evaluation {
    role: Option<Role>,
    allowed: AllowList,
}

// Bumped whenever a check is superseded or the guard unmounts. A check only
// publishes its result while its generation is still current.
#[derive(Debug, Default)]
struct Cycle {
    generation: u64,
    evaluated: Option<Evaluation>,
}

/// RoleGuard
///
/// Parameterized guard for a role-gated subtree. Starts in `Checking`, waits for
/// the identity provider to finish hydrating, then settles in `Authorized` or
/// `Redirecting` (after asking the navigator to leave). Children are only ever
/// handed out in `Authorized`.
///
/// Mounting spawns onto the current tokio runtime. Dropping the guard is
/// unmounting: a check still in flight is aborted and never navigates.
pub struct RoleGuard {
    provider: IdentityState,
    navigator: NavigatorState,
    allowed: AllowList,
    options: GuardOptions,
    state: Arc<watch::Sender<GuardState>>,
    cycle: Arc<Mutex<Cycle>>,
    pending: Option<JoinHandle<()>>,
}

impl RoleGuard {
    pub fn mount(
        provider: IdentityState,
        navigator: NavigatorState,
        allowed: AllowList,
        options: GuardOptions,
    ) -> Self {
        let (state, _rx) = watch::channel(GuardState::Checking);
        let mut guard = Self {
            provider,
            navigator,
            allowed,
            options,
            state: Arc::new(state),
            cycle: Arc::new(Mutex::new(Cycle::default())),
            pending: None,
        };
        guard.start_check();
        guard
    }

    /// A guard admitting only `role`, the default for each named dashboard.
    pub fn for_role(
        role: Role,
        provider: IdentityState,
        navigator: NavigatorState,
        options: GuardOptions,
    ) -> Self {
        Self::mount(provider, navigator, AllowList::only(role), options)
    }

    pub fn state(&self) -> GuardState {
        *self.state.borrow()
    }

    pub fn allowed_roles(&self) -> &AllowList {
        &self.allowed
    }

    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    /// Waits until the current check has left `Checking`.
    pub async fn settled(&self) -> GuardState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|state| *state != GuardState::Checking).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    /// Re-reads the current role. Re-evaluates only when the role or allow-list
    /// differs from what the last completed check saw.
    pub fn sync(&mut self) {
        let current = Evaluation {
            role: resolve_role(self.provider.as_ref()),
            allowed: self.allowed.clone(),
        };
        let needs_check = match &self
            .cycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .evaluated
        {
            // Still in flight: the pending check reads the role when it runs.
            None => false,
            Some(last) => *last != current,
        };
        if needs_check {
            self.start_check();
        }
    }

    pub fn set_allowed_roles(&mut self, allowed: AllowList) {
        if allowed == self.allowed {
            return;
        }
        self.allowed = allowed;
        self.start_check();
    }

    pub fn render<'a, T: ?Sized>(&self, children: &'a T, fallback: Option<&'a T>) -> View<'a, T> {
        match self.state() {
            GuardState::Authorized => View::Children(children),
            GuardState::Redirecting { .. } => View::Nothing,
            GuardState::Checking => match fallback {
                Some(fallback) => View::Fallback(fallback),
                None => View::Loading,
            },
        }
    }

    // Supersedes any check in flight and returns the new generation.
    fn cancel_pending(&mut self) -> u64 {
        let generation = {
            let mut cycle = self.cycle.lock().unwrap_or_else(PoisonError::into_inner);
            cycle.generation += 1;
            cycle.evaluated = None;
            cycle.generation
        };
        if let Some(task) = self.pending.take() {
            task.abort();
        }
        generation
    }

    fn start_check(&mut self) {
        let generation = self.cancel_pending();
        self.state.send_replace(GuardState::Checking);

        let check = Check {
            generation,
            provider: self.provider.clone(),
            navigator: self.navigator.clone(),
            allowed: self.allowed.clone(),
            hydration_timeout: self.options.hydration_timeout,
            state: self.state.clone(),
            cycle: self.cycle.clone(),
        };
        self.pending = Some(tokio::spawn(check.run()));
    }
}

impl Drop for RoleGuard {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

struct Check {
    generation: u64,
    provider: IdentityState,
    navigator: NavigatorState,
    allowed: AllowList,
    hydration_timeout: Option<Duration>,
    state: Arc<watch::Sender<GuardState>>,
    cycle: Arc<Mutex<Cycle>>,
}

impl Check {
    async fn run(self) {
        let hydrated = match self.hydration_timeout {
            Some(limit) => tokio::time::timeout(limit, self.provider.hydrated())
                .await
                .is_ok(),
            None => {
                self.provider.hydrated().await;
                true
            }
        };

        let identity = if hydrated {
            resolve_identity(self.provider.as_ref())
        } else {
            tracing::warn!("session hydration timed out, treating visitor as signed out");
            None
        };

        // Publishing happens under the cycle lock, so a guard that has been
        // re-checked or unmounted in the meantime sees nothing from this check.
        let decision = {
            let mut cycle = self.cycle.lock().unwrap_or_else(PoisonError::into_inner);
            if cycle.generation != self.generation {
                return;
            }
            cycle.evaluated = Some(Evaluation {
                role: identity.as_ref().map(|user| user.role),
                allowed: self.allowed.clone(),
            });

            let decision = authorize(identity.as_ref(), &self.allowed);
            self.state.send_replace(match decision {
                GuardDecision::Authorize => GuardState::Authorized,
                GuardDecision::Redirect(to) => GuardState::Redirecting { to },
            });
            decision
        };

        // Navigation runs without the lock held: the host may unmount the guard
        // from inside `navigate`, and unmounting takes the same lock.
        if let GuardDecision::Redirect(to) = decision {
            if !self.is_current() {
                return;
            }
            tracing::debug!(to, "guard redirecting");
            self.navigator.navigate(to);
        }
    }

    fn is_current(&self) -> bool {
        self.cycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
            == self.generation
    }
}
