//! Shared pagination types used by list endpoints

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Raw query-string pagination input
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Clamped pagination parameters (1-based page)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    pub fn from_query(query: &PageQuery) -> Self {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// One page of items plus page metadata
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + params.limit - 1) / params.limit
        };
        Self {
            items,
            total,
            page: params.page,
            limit: params.limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let params = PageParams::from_query(&PageQuery::default());
        assert_eq!(params, PageParams { page: 1, limit: DEFAULT_PAGE_SIZE });

        let params = PageParams::from_query(&PageQuery {
            page: Some(-3),
            limit: Some(0),
        });
        assert_eq!(params, PageParams { page: 1, limit: 1 });

        let params = PageParams::from_query(&PageQuery {
            page: Some(4),
            limit: Some(10_000),
        });
        assert_eq!(params, PageParams { page: 4, limit: MAX_PAGE_SIZE });
    }

    #[test]
    fn test_offset_math() {
        let params = PageParams { page: 3, limit: 10 };
        assert_eq!(params.offset(), 20);
        assert_eq!(PageParams { page: 1, limit: 10 }.offset(), 0);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let params = PageParams { page: 1, limit: 10 };
        assert_eq!(Page::<i64>::new(vec![], 0, params).total_pages, 0);
        assert_eq!(Page::new(vec![1], 1, params).total_pages, 1);
        assert_eq!(Page::new(vec![1], 10, params).total_pages, 1);
        assert_eq!(Page::new(vec![1], 11, params).total_pages, 2);
    }
}
