//! Offset pagination for list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size when the client does not provide one.
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Largest page size a client may request.
pub const MAX_PER_PAGE: i64 = 100;

/// Highest page number honoured; larger values are clamped.
pub const MAX_PAGE: i64 = 1_000_000;

/// Page parameters as received from a query string.
///
/// Values are clamped rather than rejected: page 0 becomes 1, pages past
/// [`MAX_PAGE`] become [`MAX_PAGE`] and an oversized `per_page` becomes
/// [`MAX_PER_PAGE`].
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub per_page: Option<i64>,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: None,
            per_page: None,
        }
    }
}

impl PageParams {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    /// Row offset for SQL `OFFSET`.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }

    /// Row limit for SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        self.per_page()
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PageInfo {
    pub fn new(params: &PageParams, total: i64) -> Self {
        let per_page = params.per_page();
        let total_pages = if total <= 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            page: params.page(),
            per_page,
            total,
            total_pages,
        }
    }
}

/// A page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, params: &PageParams, total: i64) -> Self {
        Self {
            data,
            pagination: PageInfo::new(params, total),
        }
    }

    /// Converts every item while keeping the pagination metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let params = PageParams::new(0, 1000);
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), MAX_PER_PAGE);

        let params = PageParams::new(-3, 0);
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 1);
    }

    #[test]
    fn test_huge_page_is_clamped() {
        let params = PageParams::new(i64::MAX, MAX_PER_PAGE);
        assert_eq!(params.page(), MAX_PAGE);
        assert_eq!(params.offset(), (MAX_PAGE - 1) * MAX_PER_PAGE);

        let params: PageParams =
            serde_json::from_str(r#"{"page": 9223372036854775807, "per_page": 20}"#).unwrap();
        assert!(params.offset() >= 0);
        assert_eq!(PageInfo::new(&params, 5).page, MAX_PAGE);
    }

    #[test]
    fn test_offset() {
        let params = PageParams::new(3, 10);
        assert_eq!(params.offset(), 20);
        assert_eq!(params.limit(), 10);
    }

    #[test]
    fn test_page_info_total_pages() {
        let params = PageParams::new(1, 10);
        assert_eq!(PageInfo::new(&params, 0).total_pages, 0);
        assert_eq!(PageInfo::new(&params, 1).total_pages, 1);
        assert_eq!(PageInfo::new(&params, 10).total_pages, 1);
        assert_eq!(PageInfo::new(&params, 11).total_pages, 2);
    }

    #[test]
    fn test_paginated_map() {
        let params = PageParams::new(2, 2);
        let page = Paginated::new(vec![1, 2], &params, 5).map(|n| n * 10);
        assert_eq!(page.data, vec![10, 20]);
        assert_eq!(page.pagination.page, 2);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[test]
    fn test_deserialize_from_query_like_json() {
        let params: PageParams = serde_json::from_str(r#"{"page": 4}"#).unwrap();
        assert_eq!(params.page(), 4);
        assert_eq!(params.per_page(), DEFAULT_PER_PAGE);
    }
}
