//! Page numbers.

use serde::{Deserialize, Serialize};

/// A 1-based page of `per_page` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Page number. Zero is treated as the first page.
    pub number: i64,
    /// Items per page.
    pub per_page: i64,
}

impl Page {
    /// Creates a page.
    #[must_use]
    pub const fn new(number: i64, per_page: i64) -> Self {
        Self { number, per_page }
    }

    const fn current(&self) -> i64 {
        if self.number < 1 {
            1
        } else {
            self.number
        }
    }

    /// Rows skipped before this page.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.current() - 1).saturating_mul(self.per_page)
    }

    /// Returns true if `total` items reach past this page.
    #[must_use]
    pub const fn has_next(&self, total: i64) -> bool {
        total > self.current().saturating_mul(self.per_page)
    }
}
