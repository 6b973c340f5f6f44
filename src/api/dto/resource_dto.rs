//! Wire-only shapes for the resource endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Event, Ident};

/// Response to `POST /event`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    /// Identifier of the stored event.
    pub event_id: Ident,
    /// Alerts raised by the event, in trigger registration order.
    pub alert_ids: Vec<Ident>,
    /// The stored event.
    pub event: Event,
}

/// Filter by event type for event and trigger listings.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct EventTypeFilter {
    /// Only return resources bound to this event type.
    #[serde(default)]
    pub event_type_id: Option<Ident>,
}

/// Filter by trigger for alert listings.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct TriggerFilter {
    /// Only return alerts raised by this trigger.
    #[serde(default)]
    pub trigger_id: Option<Ident>,
}

/// Body of the raw-query search endpoints.
///
/// A bare clause without the `query` wrapper is accepted as well.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QueryRequest {
    /// Clause in the standing-query language, e.g. `{"term": {"host": "a"}}`.
    #[schema(value_type = Object)]
    pub query: serde_json::Value,
}
