//! Trigger handlers: register, list, get, update, delete.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{Deleted, Envelope, EventTypeFilter, PaginationParams};
use crate::app_state::AppState;
use crate::domain::{Ident, NewTrigger, Trigger, TriggerUpdate};
use crate::error::{ErrorResponse, WorkflowError};

/// `POST /trigger` — Register a trigger and its standing query.
///
/// # Errors
///
/// Returns [`WorkflowError::Validation`] or [`WorkflowError::InvalidQuery`]
/// for a bad body or condition, and [`WorkflowError::NotFound`] if the
/// event type does not exist.
#[utoipa::path(
    post,
    path = "/api/v1/trigger",
    tag = "Triggers",
    summary = "Register a trigger",
    description = "Compiles the condition against the event type's mapping and registers it as a standing query. Every later event of that type satisfying the condition raises an alert.",
    request_body = NewTrigger,
    responses(
        (status = 201, description = "Trigger created", body = Envelope<Trigger>),
        (status = 400, description = "Invalid trigger or condition", body = ErrorResponse),
        (status = 404, description = "Event type not found", body = ErrorResponse),
    )
)]
pub async fn create_trigger(
    State(state): State<AppState>,
    payload: Result<Json<NewTrigger>, JsonRejection>,
) -> Result<impl IntoResponse, WorkflowError> {
    let Json(input) = payload?;
    let trigger = state.triggers.post(input).await?;
    Ok(Envelope::created(trigger))
}

/// `GET /trigger` — List triggers, optionally for one event type.
///
/// # Errors
///
/// Returns [`WorkflowError::Dependency`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/trigger",
    tag = "Triggers",
    summary = "List triggers",
    params(PaginationParams, EventTypeFilter),
    responses(
        (status = 200, description = "Paginated triggers", body = Envelope<Vec<Trigger>>),
    )
)]
pub async fn list_triggers(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<EventTypeFilter>,
) -> Result<impl IntoResponse, WorkflowError> {
    let pagination = params.to_pagination(state.max_page_size);
    let page = state
        .triggers
        .get_all(&pagination, filter.event_type_id.as_ref())
        .await?;
    Ok(Envelope::page(page, &pagination))
}

/// `GET /trigger/{id}` — Get one trigger.
///
/// # Errors
///
/// Returns [`WorkflowError::NotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/trigger/{id}",
    tag = "Triggers",
    summary = "Get a trigger",
    params(("id" = String, Path, description = "Trigger id")),
    responses(
        (status = 200, description = "Trigger", body = Envelope<Trigger>),
        (status = 404, description = "Trigger not found", body = ErrorResponse),
    )
)]
pub async fn get_trigger(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WorkflowError> {
    let trigger = state.triggers.get_one(&Ident::from(id)).await?;
    Ok(Envelope::ok(trigger))
}

/// `PUT /trigger/{id}` — Enable or disable a trigger.
///
/// # Errors
///
/// Returns [`WorkflowError::NotFound`] if it does not exist.
#[utoipa::path(
    put,
    path = "/api/v1/trigger/{id}",
    tag = "Triggers",
    summary = "Update a trigger",
    description = "Only the enabled flag is mutable. Disabled triggers keep their standing query but raise no alerts.",
    params(("id" = String, Path, description = "Trigger id")),
    request_body = TriggerUpdate,
    responses(
        (status = 200, description = "Trigger updated", body = Envelope<Trigger>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Trigger not found", body = ErrorResponse),
    )
)]
pub async fn update_trigger(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TriggerUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, WorkflowError> {
    let Json(update) = payload?;
    let trigger = state.triggers.update(&Ident::from(id), update).await?;
    Ok(Envelope::ok(trigger))
}

/// `DELETE /trigger/{id}` — Deregister and delete a trigger.
///
/// # Errors
///
/// Returns [`WorkflowError::NotFound`] if it does not exist and
/// [`WorkflowError::InconsistentState`] if its standing query was missing.
#[utoipa::path(
    delete,
    path = "/api/v1/trigger/{id}",
    tag = "Triggers",
    summary = "Delete a trigger",
    params(("id" = String, Path, description = "Trigger id")),
    responses(
        (status = 200, description = "Trigger deleted", body = Envelope<Deleted>),
        (status = 404, description = "Trigger not found", body = ErrorResponse),
        (status = 500, description = "Standing query missing", body = ErrorResponse),
    )
)]
pub async fn delete_trigger(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WorkflowError> {
    state.triggers.delete(&Ident::from(id.as_str())).await?;
    Ok(Envelope::ok(Deleted { id }))
}

/// Trigger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trigger", get(list_triggers).post(create_trigger))
        .route(
            "/trigger/{id}",
            get(get_trigger).put(update_trigger).delete(delete_trigger),
        )
}
