//! Event type handlers: register, list, get, delete.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{Deleted, Envelope, PaginationParams};
use crate::app_state::AppState;
use crate::domain::{EventType, Ident, NewEventType};
use crate::error::{ErrorResponse, WorkflowError};

/// `POST /eventType` — Register an event schema.
///
/// # Errors
///
/// Returns [`WorkflowError::Validation`] for a malformed body and
/// [`WorkflowError::Conflict`] if the name is taken.
#[utoipa::path(
    post,
    path = "/api/v1/eventType",
    tag = "EventTypes",
    summary = "Register an event type",
    description = "Registers a named schema mapping field names to field kinds. Names are unique.",
    request_body = NewEventType,
    responses(
        (status = 201, description = "Event type created", body = Envelope<EventType>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Name already registered", body = ErrorResponse),
    )
)]
pub async fn create_event_type(
    State(state): State<AppState>,
    payload: Result<Json<NewEventType>, JsonRejection>,
) -> Result<impl IntoResponse, WorkflowError> {
    let Json(input) = payload?;
    let event_type = state.event_types.post(input).await?;
    Ok(Envelope::created(event_type))
}

/// `GET /eventType` — List event types.
///
/// # Errors
///
/// Returns [`WorkflowError::Dependency`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/eventType",
    tag = "EventTypes",
    summary = "List event types",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated event types", body = Envelope<Vec<EventType>>),
    )
)]
pub async fn list_event_types(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, WorkflowError> {
    let pagination = params.to_pagination(state.max_page_size);
    let page = state.event_types.get_all(&pagination).await?;
    Ok(Envelope::page(page, &pagination))
}

/// `GET /eventType/{id}` — Get one event type.
///
/// # Errors
///
/// Returns [`WorkflowError::NotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/eventType/{id}",
    tag = "EventTypes",
    summary = "Get an event type",
    params(("id" = String, Path, description = "Event type id")),
    responses(
        (status = 200, description = "Event type", body = Envelope<EventType>),
        (status = 404, description = "Event type not found", body = ErrorResponse),
    )
)]
pub async fn get_event_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WorkflowError> {
    let event_type = state.event_types.get_one(&Ident::from(id)).await?;
    Ok(Envelope::ok(event_type))
}

/// `DELETE /eventType/{id}` — Delete an unreferenced event type.
///
/// # Errors
///
/// Returns [`WorkflowError::NotFound`] if it does not exist and
/// [`WorkflowError::Conflict`] while events or triggers refer to it.
#[utoipa::path(
    delete,
    path = "/api/v1/eventType/{id}",
    tag = "EventTypes",
    summary = "Delete an event type",
    description = "Refused with 409 while any event or trigger refers to the type.",
    params(("id" = String, Path, description = "Event type id")),
    responses(
        (status = 200, description = "Event type deleted", body = Envelope<Deleted>),
        (status = 404, description = "Event type not found", body = ErrorResponse),
        (status = 409, description = "Event type still referenced", body = ErrorResponse),
    )
)]
pub async fn delete_event_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WorkflowError> {
    state.event_types.delete(&Ident::from(id.as_str())).await?;
    Ok(Envelope::ok(Deleted { id }))
}

/// Event type routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/eventType", get(list_event_types).post(create_event_type))
        .route("/eventType/{id}", get(get_event_type).delete(delete_event_type))
}
