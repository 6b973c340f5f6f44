//! Gateway error types with HTTP status code mapping.
//!
//! [`WorkflowError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Ident, IdentKind};
use crate::store::{QueryError, StoreError};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "statusCode": 404,
///   "error": {
///     "code": 2001,
///     "message": "trigger not found: T7"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// HTTP status code, repeated in the body.
    pub status_code: u16,
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Service-level error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Request body or event data failed validation.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A trigger condition or raw search query did not compile.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    /// The referenced resource does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of resource looked up.
        kind: IdentKind,
        /// Identifier that was not found.
        id: Ident,
    },

    /// The operation collides with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The document store or matching service failed.
    #[error("{operation} failed: {source}")]
    Dependency {
        /// Operation that was being performed.
        operation: &'static str,
        /// Underlying fault.
        #[source]
        source: StoreError,
    },

    /// Stored records and the standing-query index disagree.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    /// Shorthand for [`WorkflowError::NotFound`].
    #[must_use]
    pub fn not_found(kind: IdentKind, id: &Ident) -> Self {
        Self::NotFound {
            kind,
            id: id.clone(),
        }
    }

    /// Wraps a store fault raised while performing `operation`.
    ///
    /// Invalid user-supplied queries surface as [`WorkflowError::InvalidQuery`]
    /// rather than as a dependency failure.
    #[must_use]
    pub fn dependency(operation: &'static str, source: StoreError) -> Self {
        match source {
            StoreError::InvalidQuery(err) => Self::InvalidQuery(err),
            source => Self::Dependency { operation, source },
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::InvalidQuery(_) => 1002,
            Self::NotFound { .. } => 2001,
            Self::Conflict(_) => 2002,
            Self::Internal(_) => 3000,
            Self::Dependency { .. } => 3001,
            Self::InconsistentState(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Dependency { .. } | Self::InconsistentState(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for WorkflowError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            Self::Dependency { source, .. } => Some(source.to_string()),
            _ => None,
        };
        let body = ErrorResponse {
            status_code: status.as_u16(),
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
