//! Alert handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use crate::api::dto::{Deleted, Envelope, PaginationParams, QueryRequest, TriggerFilter};
use crate::app_state::AppState;
use crate::domain::{Alert, Ident, NewAlert};
use crate::error::{ErrorResponse, WorkflowError};

/// `POST /alert` — Record an alert by hand.
///
/// # Errors
///
/// Returns [`WorkflowError::NotFound`] if the trigger or event does not
/// exist.
#[utoipa::path(
    post,
    path = "/api/v1/alert",
    tag = "Alerts",
    summary = "Create an alert",
    request_body = NewAlert,
    responses(
        (status = 201, description = "Alert created", body = Envelope<Alert>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Trigger or event not found", body = ErrorResponse),
    )
)]
pub async fn create_alert(
    State(state): State<AppState>,
    payload: Result<Json<NewAlert>, JsonRejection>,
) -> Result<impl IntoResponse, WorkflowError> {
    let Json(input) = payload?;
    let alert = state.alerts.post(input).await?;
    Ok(Envelope::created(alert))
}

/// `GET /alert` — List alerts, optionally for one trigger.
///
/// # Errors
///
/// Returns [`WorkflowError::Dependency`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/alert",
    tag = "Alerts",
    summary = "List alerts",
    params(PaginationParams, TriggerFilter),
    responses(
        (status = 200, description = "Paginated alerts", body = Envelope<Vec<Alert>>),
    )
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<TriggerFilter>,
) -> Result<impl IntoResponse, WorkflowError> {
    let pagination = params.to_pagination(state.max_page_size);
    let page = match filter.trigger_id {
        Some(trigger_id) => {
            state
                .alerts
                .get_all_by_trigger(&trigger_id, &pagination)
                .await?
        }
        None => state.alerts.get_all(&pagination).await?,
    };
    Ok(Envelope::page(page, &pagination))
}

/// `POST /alert/query` — Search alerts with a raw query.
///
/// # Errors
///
/// Returns [`WorkflowError::InvalidQuery`] if the query does not compile.
#[utoipa::path(
    post,
    path = "/api/v1/alert/query",
    tag = "Alerts",
    summary = "Query alerts",
    params(PaginationParams),
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Matching alerts", body = Envelope<Vec<Alert>>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
    )
)]
pub async fn query_alerts(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, WorkflowError> {
    let Json(query) = payload?;
    let pagination = params.to_pagination(state.max_page_size);
    let page = state.alerts.query(&query, &pagination).await?;
    Ok(Envelope::page(page, &pagination))
}

/// `GET /alert/{id}` — Get one alert.
///
/// # Errors
///
/// Returns [`WorkflowError::NotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/alert/{id}",
    tag = "Alerts",
    summary = "Get an alert",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert", body = Envelope<Alert>),
        (status = 404, description = "Alert not found", body = ErrorResponse),
    )
)]
pub async fn get_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WorkflowError> {
    let alert = state.alerts.get_one(&Ident::from(id)).await?;
    Ok(Envelope::ok(alert))
}

/// `DELETE /alert/{id}` — Delete an alert.
///
/// # Errors
///
/// Returns [`WorkflowError::NotFound`] if it does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/alert/{id}",
    tag = "Alerts",
    summary = "Delete an alert",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert deleted", body = Envelope<Deleted>),
        (status = 404, description = "Alert not found", body = ErrorResponse),
    )
)]
pub async fn delete_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WorkflowError> {
    state.alerts.delete(&Ident::from(id.as_str())).await?;
    Ok(Envelope::ok(Deleted { id }))
}

/// Alert routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/alert", get(list_alerts).post(create_alert))
        .route("/alert/query", post(query_alerts))
        .route("/alert/{id}", get(get_alert).delete(delete_alert))
}
