//! Event handlers: ingest, list, query, get, delete.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use crate::api::dto::{
    Deleted, Envelope, EventTypeFilter, IngestResponse, PaginationParams, QueryRequest,
};
use crate::app_state::AppState;
use crate::domain::{Event, Ident, NewEvent};
use crate::error::{ErrorResponse, WorkflowError};

/// `POST /event` — Ingest an event and raise alerts for matching triggers.
///
/// # Errors
///
/// Returns [`WorkflowError::Validation`] if the data does not conform to
/// the event type and [`WorkflowError::NotFound`] if the type is unknown.
#[utoipa::path(
    post,
    path = "/api/v1/event",
    tag = "Events",
    summary = "Post an event",
    description = "Validates the event against its type, stores it, and creates one alert per enabled trigger whose condition it satisfies. Events with a cronSchedule are stored but not matched.",
    request_body = NewEvent,
    responses(
        (status = 201, description = "Event stored", body = Envelope<IngestResponse>),
        (status = 400, description = "Invalid event", body = ErrorResponse),
        (status = 404, description = "Event type not found", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<impl IntoResponse, WorkflowError> {
    let Json(input) = payload?;
    let ingestion = state.events.ingest(input).await?;
    Ok(Envelope::created(IngestResponse {
        event_id: ingestion.event.event_id.clone(),
        alert_ids: ingestion.alert_ids,
        event: ingestion.event,
    }))
}

/// `GET /event` — List events, optionally of one type.
///
/// # Errors
///
/// Returns [`WorkflowError::Dependency`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/event",
    tag = "Events",
    summary = "List events",
    params(PaginationParams, EventTypeFilter),
    responses(
        (status = 200, description = "Paginated events", body = Envelope<Vec<Event>>),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<EventTypeFilter>,
) -> Result<impl IntoResponse, WorkflowError> {
    let pagination = params.to_pagination(state.max_page_size);
    let page = state
        .events
        .get_all(&pagination, filter.event_type_id.as_ref())
        .await?;
    Ok(Envelope::page(page, &pagination))
}

/// `POST /event/query` — Search events with a raw query.
///
/// # Errors
///
/// Returns [`WorkflowError::InvalidQuery`] if the query does not compile.
#[utoipa::path(
    post,
    path = "/api/v1/event/query",
    tag = "Events",
    summary = "Query events",
    description = "Runs a query in the standing-query language against stored event documents.",
    params(PaginationParams),
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Matching events", body = Envelope<Vec<Event>>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
    )
)]
pub async fn query_events(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, WorkflowError> {
    let Json(query) = payload?;
    let pagination = params.to_pagination(state.max_page_size);
    let page = state.events.query(&query, &pagination).await?;
    Ok(Envelope::page(page, &pagination))
}

/// `GET /event/{id}` — Get one event.
///
/// # Errors
///
/// Returns [`WorkflowError::NotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/event/{id}",
    tag = "Events",
    summary = "Get an event",
    params(("id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event", body = Envelope<Event>),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WorkflowError> {
    let event = state.events.get_one(&Ident::from(id)).await?;
    Ok(Envelope::ok(event))
}

/// `DELETE /event/{id}` — Delete an event.
///
/// # Errors
///
/// Returns [`WorkflowError::NotFound`] if it does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/event/{id}",
    tag = "Events",
    summary = "Delete an event",
    params(("id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event deleted", body = Envelope<Deleted>),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WorkflowError> {
    state.events.delete(&Ident::from(id.as_str())).await?;
    Ok(Envelope::ok(Deleted { id }))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/event", get(list_events).post(create_event))
        .route("/event/query", post(query_events))
        .route("/event/{id}", get(get_event).delete(delete_event))
}
