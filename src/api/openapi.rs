//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::{Deleted, IngestResponse, PaginationMeta, QueryRequest};
use super::handlers::{alert, event, event_type, system, trigger};
use crate::domain::{
    Alert, Event, EventType, FieldKind, JobRequest, JobType, NewAlert, NewEvent, NewEventType,
    NewTrigger, StatsSnapshot, Trigger, TriggerUpdate,
};
use crate::error::{ErrorBody, ErrorResponse};
use crate::store::SortOrder;

/// OpenAPI documentation for the workflow gateway.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        event_type::create_event_type,
        event_type::list_event_types,
        event_type::get_event_type,
        event_type::delete_event_type,
        event::create_event,
        event::list_events,
        event::query_events,
        event::get_event,
        event::delete_event,
        trigger::create_trigger,
        trigger::list_triggers,
        trigger::get_trigger,
        trigger::update_trigger,
        trigger::delete_trigger,
        alert::create_alert,
        alert::list_alerts,
        alert::query_alerts,
        alert::get_alert,
        alert::delete_alert,
        system::root_handler,
        system::health_handler,
        system::version_handler,
        system::stats_handler,
    ),
    components(schemas(
        EventType,
        NewEventType,
        FieldKind,
        Event,
        NewEvent,
        Trigger,
        NewTrigger,
        TriggerUpdate,
        JobRequest,
        JobType,
        Alert,
        NewAlert,
        StatsSnapshot,
        IngestResponse,
        QueryRequest,
        PaginationMeta,
        SortOrder,
        Deleted,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "EventTypes", description = "Event schemas"),
        (name = "Events", description = "Event ingestion and search"),
        (name = "Triggers", description = "Standing conditions over events"),
        (name = "Alerts", description = "Records of triggers firing"),
        (name = "System", description = "Health, version and counters"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_resource_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/v1/eventType"));
        assert!(paths.contains_key("/api/v1/trigger/{id}"));
        assert!(paths.contains_key("/api/v1/event/query"));
        assert!(paths.contains_key("/admin/stats"));
    }
}
