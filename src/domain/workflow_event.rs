//! Notifications emitted after state changes.
//!
//! Every successful mutation publishes a [`WorkflowEvent`] through the
//! [`super::EventBus`]. WebSocket subscribers receive them filtered by
//! trigger or event type.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{Ident, JobRequest};

/// Notification emitted after a state change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum WorkflowEvent {
    /// An event was stored (and matched, unless it is scheduled).
    EventIngested {
        /// Stored event.
        event_id: Ident,
        /// Its event type.
        event_type_id: Ident,
        /// Alerts created for it.
        alert_ids: Vec<Ident>,
        /// Ingestion time.
        timestamp: DateTime<Utc>,
    },

    /// A trigger was registered.
    TriggerCreated {
        /// New trigger.
        trigger_id: Ident,
        /// Event type it watches.
        event_type_id: Ident,
        /// Registration time.
        timestamp: DateTime<Utc>,
    },

    /// A trigger was deregistered and deleted.
    TriggerRemoved {
        /// Removed trigger.
        trigger_id: Ident,
        /// Event type it watched.
        event_type_id: Ident,
        /// Removal time.
        timestamp: DateTime<Utc>,
    },

    /// An alert was created.
    AlertCreated {
        /// New alert.
        alert_id: Ident,
        /// Trigger that fired.
        trigger_id: Ident,
        /// Event that matched.
        event_id: Ident,
        /// Event type of the event.
        event_type_id: Ident,
        /// Creation time.
        timestamp: DateTime<Utc>,
    },

    /// A job was handed to downstream workers.
    JobRequested {
        /// Job identifier.
        job_id: Uuid,
        /// Trigger that fired.
        trigger_id: Ident,
        /// Event that matched.
        event_id: Ident,
        /// Event type of the event.
        event_type_id: Ident,
        /// Rendered job request.
        job: JobRequest,
        /// Request time.
        timestamp: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    /// Returns the event type the notification concerns.
    #[must_use]
    pub fn event_type_id(&self) -> &Ident {
        match self {
            Self::EventIngested { event_type_id, .. }
            | Self::TriggerCreated { event_type_id, .. }
            | Self::TriggerRemoved { event_type_id, .. }
            | Self::AlertCreated { event_type_id, .. }
            | Self::JobRequested { event_type_id, .. } => event_type_id,
        }
    }

    /// Returns the trigger the notification concerns, if any.
    #[must_use]
    pub fn trigger_id(&self) -> Option<&Ident> {
        match self {
            Self::EventIngested { .. } => None,
            Self::TriggerCreated { trigger_id, .. }
            | Self::TriggerRemoved { trigger_id, .. }
            | Self::AlertCreated { trigger_id, .. }
            | Self::JobRequested { trigger_id, .. } => Some(trigger_id),
        }
    }

    /// Returns the notification type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::EventIngested { .. } => "event_ingested",
            Self::TriggerCreated { .. } => "trigger_created",
            Self::TriggerRemoved { .. } => "trigger_removed",
            Self::AlertCreated { .. } => "alert_created",
            Self::JobRequested { .. } => "job_requested",
        }
    }
}
