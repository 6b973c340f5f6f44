//! Posted events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::{Ident, IdentKind};
use crate::store::Resource;

/// An event instance conforming to an [`EventType`](super::EventType).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Identifier (`E<n>`).
    pub event_id: Ident,
    /// Event type the data conforms to.
    pub event_type_id: Ident,
    /// Field values.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
    /// Creator.
    #[serde(default)]
    pub created_by: String,
    /// Creation time.
    pub created_on: DateTime<Utc>,
    /// Present when the event is a template for repeated re-submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_schedule: Option<String>,
}

impl Event {
    /// Returns `true` if this event is a repeating template rather than an
    /// occurrence.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.cron_schedule.is_some()
    }
}

impl Resource for Event {
    const KIND: IdentKind = IdentKind::Event;
    const COLLECTION: &'static str = "events";

    fn id(&self) -> &Ident {
        &self.event_id
    }
}

/// Input for posting an event.
///
/// The event type is named either by id or by name; the id wins when both
/// are given.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    /// Event type identifier.
    #[serde(default)]
    pub event_type_id: Option<Ident>,
    /// Event type name.
    #[serde(default)]
    pub event_type_name: Option<String>,
    /// Field values.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
    /// Creator.
    #[serde(default)]
    pub created_by: String,
    /// Cron expression for repeating templates.
    #[serde(default)]
    pub cron_schedule: Option<String>,
}

/// Checks that a cron expression has the shape of one: five to seven
/// whitespace-separated fields drawn from the usual cron alphabet.
///
/// # Errors
///
/// Returns a message describing what is wrong with the expression.
pub fn validate_cron(expr: &str) -> Result<(), String> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if !(5..=7).contains(&fields.len()) {
        return Err(format!(
            "cron schedule {expr:?} must have 5 to 7 fields, found {}",
            fields.len()
        ));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || "*/,-?#LW".contains(c);
    if let Some(bad) = fields.iter().find(|f| !f.chars().all(allowed)) {
        return Err(format!("cron field {bad:?} contains invalid characters"));
    }
    Ok(())
}
