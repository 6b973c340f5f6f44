//! Alerts: the durable record that an event satisfied a trigger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Ident, IdentKind};
use crate::store::Resource;

/// Created once per (trigger, event) match. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Identifier (`A<n>`).
    pub alert_id: Ident,
    /// Trigger that fired.
    pub trigger_id: Ident,
    /// Event that satisfied it.
    pub event_id: Ident,
    /// Downstream job requested for this alert, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Creator.
    #[serde(default)]
    pub created_by: String,
    /// Creation time.
    pub created_on: DateTime<Utc>,
}

impl Resource for Alert {
    const KIND: IdentKind = IdentKind::Alert;
    const COLLECTION: &'static str = "alerts";

    fn id(&self) -> &Ident {
        &self.alert_id
    }
}

/// Input for creating an alert by hand.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    /// Trigger the alert is attributed to.
    pub trigger_id: Ident,
    /// Event the alert is attributed to.
    pub event_id: Ident,
    /// Downstream job, if one was started.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Creator.
    #[serde(default)]
    pub created_by: String,
}
