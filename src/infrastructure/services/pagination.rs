//! Limit/offset pagination

/// Page size used when none (or an out-of-range one) is requested
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Largest accepted page size
pub const MAX_PAGE_LIMIT: usize = 100;

/// A validated limit/offset window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl Page {
    /// Builds a page from raw request values.
    ///
    /// A limit outside `1..=MAX_PAGE_LIMIT` falls back to the default and a
    /// negative offset becomes 0.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit
            .and_then(|l| usize::try_from(l).ok())
            .filter(|l| (1..=MAX_PAGE_LIMIT).contains(l))
            .unwrap_or(DEFAULT_PAGE_LIMIT);

        let offset = offset
            .and_then(|o| usize::try_from(o).ok())
            .unwrap_or(0);

        Self { limit, offset }
    }

    /// Slices `[offset, offset + limit)` out of an already ordered set
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        if self.offset >= items.len() {
            return Vec::new();
        }

        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}
