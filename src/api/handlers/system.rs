//! System endpoints: service info, health check, version, admin stats.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::Envelope;
use crate::app_state::AppState;
use crate::domain::StatsSnapshot;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// Build information.
#[derive(Debug, Serialize, ToSchema)]
pub struct VersionResponse {
    name: String,
    version: String,
}

/// `GET /` — Service banner.
#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    summary = "Service info",
    responses(
        (status = 200, description = "Service name and version", body = VersionResponse),
    )
)]
pub async fn root_handler() -> impl IntoResponse {
    version_handler().await
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /version` — Package name and version.
#[utoipa::path(
    get,
    path = "/version",
    tag = "System",
    summary = "Version",
    responses(
        (status = 200, description = "Package name and version", body = VersionResponse),
    )
)]
pub async fn version_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(VersionResponse {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /admin/stats` — Activity counters since startup.
#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "System",
    summary = "Activity counters",
    description = "Monotonic creation counters for event types, events, triggers, alerts and dispatched jobs. Deletions do not decrement them.",
    responses(
        (status = 200, description = "Counter snapshot", body = Envelope<StatsSnapshot>),
    )
)]
pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    Envelope::ok(state.stats.snapshot())
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/admin/stats", get(stats_handler))
}
