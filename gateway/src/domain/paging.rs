//! List windowing for recipe and collection listings.
//!
//! Upstream list endpoints return every item at once together with a total.
//! The gateway applies the caller's window locally so callers get a stable
//! `offset`/`limit` contract regardless of upstream support.

/// Window requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListQuery {
    /// Number of items to skip.
    pub offset: usize,
    /// Maximum number of items to return; `None` returns the remainder.
    pub limit: Option<usize>,
}

impl ListQuery {
    /// Query returning every item.
    pub fn all() -> Self {
        Self::default()
    }

    /// Query returning at most `limit` items after skipping `offset`.
    pub fn window(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }

    /// Apply the window to `items`, keeping `total` as reported upstream.
    pub fn apply<T>(&self, items: Vec<T>, total: usize) -> Page<T> {
        let limit = self.limit.unwrap_or(usize::MAX);
        let items = items.into_iter().skip(self.offset).take(limit).collect();
        Page { items, total }
    }
}

/// One window of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items inside the window.
    pub items: Vec<T>,
    /// Total number of items upstream.
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ListQuery::all(), vec![1, 2, 3, 4, 5])]
    #[case(ListQuery::window(1, 2), vec![2, 3])]
    #[case(ListQuery::window(4, 10), vec![5])]
    #[case(ListQuery::window(9, 1), vec![])]
    fn windows_slice_items(#[case] query: ListQuery, #[case] expected: Vec<i32>) {
        let page = query.apply(vec![1, 2, 3, 4, 5], 5);
        assert_eq!(page.items, expected);
        assert_eq!(page.total, 5);
    }
}
