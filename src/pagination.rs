use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("page size must be at least 1")]
    ZeroPageSize,
}

/// Paginator
///
/// Splits an in-memory list (projects, tasks, meetings) into fixed-size pages.
/// Pages are 1-based and out-of-range requests are clamped to the nearest page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
}

/// One page of a list plus enough context to render pager controls.
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

impl Paginator {
    pub fn new(page_size: usize) -> Result<Self, PaginationError> {
        if page_size == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        Ok(Self { page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Always at least one page, so an empty list still renders "page 1 of 1".
    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.page_size).max(1)
    }

    pub fn paginate<'a, T>(&self, items: &'a [T], page: usize) -> Page<'a, T> {
        let total_pages = self.total_pages(items.len());
        let page = page.clamp(1, total_pages);
        let start = ((page - 1) * self.page_size).min(items.len());
        let end = (start + self.page_size).min(items.len());

        Page {
            items: &items[start..end],
            page,
            total_pages,
            total_items: items.len(),
        }
    }
}
