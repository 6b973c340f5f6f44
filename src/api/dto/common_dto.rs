//! Shared DTO types used across multiple endpoints.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::store::{Page, Pagination, SortOrder};

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page. Defaults to 20, capped by `MAX_PAGE_SIZE`.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Field to sort by. Defaults to insertion order.
    #[serde(default)]
    pub sort_by: Option<String>,
    /// `asc` (default) or `desc`.
    #[serde(default)]
    pub order: SortOrder,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
            sort_by: None,
            order: SortOrder::Asc,
        }
    }
}

impl PaginationParams {
    /// Converts to store pagination, clamping `per_page` to `max_per_page`.
    #[must_use]
    pub fn to_pagination(&self, max_per_page: u32) -> Pagination {
        let mut pagination = Pagination::new(self.page, self.per_page.clamp(1, max_per_page.max(1)));
        pagination.order = self.order;
        if let Some(field) = self.sort_by.as_deref().filter(|f| !f.trim().is_empty()) {
            pagination = pagination.sorted_by(field.trim(), self.order);
        }
        pagination
    }
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl PaginationMeta {
    /// Builds paging metadata for a result set of `total` items.
    #[must_use]
    pub fn new(pagination: &Pagination, total: u64) -> Self {
        let per_page = u64::from(pagination.per_page);
        Self {
            page: pagination.page,
            per_page: pagination.per_page,
            total,
            total_pages: total.div_ceil(per_page.max(1)),
        }
    }
}

/// Success envelope wrapping every response payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// HTTP status code, repeated in the body.
    pub status_code: u16,
    /// Payload.
    pub data: T,
    /// Paging metadata for list responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl<T: Serialize> Envelope<T> {
    /// Wraps a single payload.
    #[must_use]
    pub fn with_status(status: StatusCode, data: T) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            pagination: None,
        }
    }

    /// Wraps a payload with `200 OK`.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    /// Wraps a newly created resource with `201 Created`.
    #[must_use]
    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, data)
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    /// Wraps one page of a list.
    #[must_use]
    pub fn page(page: Page<T>, pagination: &Pagination) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            pagination: Some(PaginationMeta::new(pagination, page.total)),
            data: page.items,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Payload of delete responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Deleted {
    /// Identifier of the removed resource.
    pub id: String,
}
