//! Page / limit / offset arithmetic shared by every paginated listing.
//!
//! ```text
//!   page=3, limit=10  ──►  OFFSET 20 LIMIT 10  ──►  rows [20, 30)
//!   total=25          ──►  totalPages = ceil(25 / 10) = 3
//! ```

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// A normalised page request. Construction clamps out-of-range input
/// instead of rejecting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// `page` is raised to at least 1; `limit` is clamped into `1..=MAX_LIMIT`.
    ///
    /// ```rust
    /// use cafe_core::pagination::PageRequest;
    ///
    /// let req = PageRequest::new(Some(0), Some(500));
    /// assert_eq!((req.page(), req.limit()), (1, 100));
    /// assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    /// ```
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        PageRequest {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    #[inline]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[inline]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows to skip: `(page - 1) * limit`.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    pub fn pagination(&self, total: i64) -> Pagination {
        Pagination::new(self.page, self.limit, total)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(None, None)
    }
}

/// Pagination block of a listing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit_i = limit.max(1) as i64;
        let total = total.max(0);
        Pagination {
            page,
            limit,
            total,
            total_pages: (total + limit_i - 1) / limit_i,
        }
    }
}

/// One page of results plus its pagination block.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Page {
            items,
            pagination: request.pagination(total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
