//! Pagination types and utilities for consistent pagination across all endpoints

use crate::error::{PaginationInfo, ResponseMetadata};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Standard pagination parameters for list endpoints
#[derive(Debug, Deserialize, IntoParams, ToSchema, Clone)]
pub struct PaginationParams {
    #[param(example = 1, minimum = 1)]
    pub page: Option<u32>,

    #[param(example = 20, minimum = 1, maximum = 100)]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    /// Get the page number (defaults to 1, minimum 1)
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the page size (defaults to 20, clamped between 1 and 100)
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Calculate the offset for SQL queries
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.page_size())
    }

    /// Calculate total pages given a total count
    #[must_use]
    pub fn total_pages(&self, total_count: i64) -> u32 {
        let size = i64::from(self.page_size());
        let pages = (total_count.max(0) + size - 1) / size;
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    /// Create response metadata with pagination info
    #[must_use]
    pub fn to_metadata(&self, total_count: i64) -> ResponseMetadata {
        let total_pages = self.total_pages(total_count);

        ResponseMetadata {
            pagination: Some(PaginationInfo {
                page: self.page(),
                page_size: self.page_size(),
                total_pages,
                has_next: self.page() < total_pages,
                has_previous: self.page() > 1,
            }),
            total_count: Some(total_count),
        }
    }

    /// Wrap data with pagination metadata
    pub fn wrap_response<T>(&self, data: T, total_count: i64) -> crate::error::ApiResponse<T> {
        crate::error::api_success_with_meta(data, self.to_metadata(total_count))
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: Some(1),
            page_size: Some(DEFAULT_PAGE_SIZE),
        }
    }
}
