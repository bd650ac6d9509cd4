//! Page arithmetic for the projects listing.

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::error::{Error, Result};

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number (1-indexed)
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Build a page request from optional query values.
    ///
    /// Missing values fall back to page 1 and the configured default size.
    /// Zero is rejected; sizes above the configured maximum are clamped.
    pub fn from_params(
        page: Option<u32>,
        per_page: Option<u32>,
        cfg: &PaginationConfig,
    ) -> Result<Self> {
        let page = page.unwrap_or(1);
        let per_page = per_page.unwrap_or(cfg.default_per_page);

        if page == 0 {
            return Err(Error::Validation("page must be >= 1".to_string()));
        }
        if per_page == 0 {
            return Err(Error::Validation("per_page must be >= 1".to_string()));
        }

        Ok(Self {
            page,
            per_page: per_page.min(cfg.max_per_page),
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(pagination: Pagination, total_items: u64, items: Vec<T>) -> Self {
        Self {
            page: pagination.page,
            per_page: pagination.per_page,
            total_pages: total_pages(total_items, pagination.per_page),
            total_items,
            items,
        }
    }
}

/// `ceil(total / per_page)`; zero items means zero pages.
pub fn total_pages(total_items: u64, per_page: u32) -> u64 {
    total_items.div_ceil(per_page.max(1) as u64)
}
