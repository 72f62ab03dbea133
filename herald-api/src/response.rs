//! API response types.
//!
//! Success bodies share the envelope `{status, data}`.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 100;

/// Page size used when the client does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    /// Response status
    pub status: &'static str,
    /// Response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response with data.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            data: Some(data),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Paginated response wrapper.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T>
where
    T: Serialize,
{
    /// Response status
    pub status: &'static str,
    /// Response data
    pub data: Vec<T>,
    /// Pagination info
    pub pagination: PaginationInfo,
}

/// Pagination information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationInfo {
    /// Current page number (1-indexed)
    pub page: u32,
    /// Items per page
    pub per_page: u32,
    /// Total number of items
    pub total: u64,
    /// Total number of pages
    pub total_pages: u32,
    /// Has next page
    pub has_next: bool,
    /// Has previous page
    pub has_prev: bool,
}

impl PaginationInfo {
    /// Creates pagination info from parameters.
    #[must_use]
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let total_pages =
            u32::try_from(total.div_ceil(u64::from(per_page.max(1)))).unwrap_or(u32::MAX);
        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Creates a paginated response around an already-sliced page.
    #[must_use]
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            status: "success",
            data,
            pagination: PaginationInfo::new(page, per_page, total),
        }
    }

    /// Slices `items` into the requested page.
    ///
    /// `page` is 1-indexed and clamped to at least 1. `per_page` defaults to
    /// [`DEFAULT_PER_PAGE`] and is clamped to `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn paginate(items: Vec<T>, page: Option<u32>, per_page: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let total = items.len() as u64;

        let skip = usize::try_from(u64::from(page - 1) * u64::from(per_page)).unwrap_or(usize::MAX);
        let data = items.into_iter().skip(skip).take(per_page as usize).collect();

        Self::new(data, page, per_page, total)
    }
}

impl<T: Serialize> IntoResponse for PaginatedResponse<T> {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Created response (HTTP 201).
#[derive(Debug, Serialize)]
pub struct CreatedResponse<T>
where
    T: Serialize,
{
    /// Response status
    pub status: &'static str,
    /// Created resource
    pub data: T,
}

impl<T: Serialize> CreatedResponse<T> {
    /// Creates a new created response.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for CreatedResponse<T> {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}
