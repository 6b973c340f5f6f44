//! Triggers and the job templates they carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::{Ident, IdentKind};
use crate::store::{PredicateId, Resource};

/// Downstream job kind plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobType {
    /// Job kind understood by the dispatcher.
    #[serde(rename = "type")]
    pub kind: String,
    /// Job parameters. String values of the form `"$field"` are replaced
    /// by the triggering event's value for `field`.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
}

/// Job template attached to a trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    /// User the job runs as.
    #[serde(default)]
    pub created_by: String,
    /// What to run.
    pub job_type: JobType,
}

impl JobRequest {
    /// Returns `true` if the template names no job.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.job_type.kind.trim().is_empty()
    }

    /// Fills `"$field"` placeholders from event data.
    ///
    /// Placeholders naming a field the event does not carry are left as
    /// they are.
    #[must_use]
    pub fn render(&self, event_data: &Map<String, Value>) -> Self {
        let data = self
            .job_type
            .data
            .iter()
            .map(|(k, v)| (k.clone(), substitute(v, event_data)))
            .collect();
        Self {
            created_by: self.created_by.clone(),
            job_type: JobType {
                kind: self.job_type.kind.clone(),
                data,
            },
        }
    }
}

fn substitute(value: &Value, event_data: &Map<String, Value>) -> Value {
    match value {
        Value::String(s) => s
            .strip_prefix('$')
            .and_then(|field| event_data.get(field))
            .cloned()
            .unwrap_or_else(|| value.clone()),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, event_data)).collect()),
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), substitute(v, event_data)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// A registered condition over one event type, plus an optional job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    /// Identifier (`T<n>`).
    pub trigger_id: Ident,
    /// Display name.
    pub name: String,
    /// Event type the condition applies to.
    pub event_type_id: Ident,
    /// Condition in the standing-query language.
    #[schema(value_type = Object)]
    pub condition: Value,
    /// Job dispatched when the trigger fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<JobRequest>,
    /// Handle of the registered standing query.
    pub percolation_id: PredicateId,
    /// Disabled triggers never produce alerts.
    pub enabled: bool,
    /// Creator.
    #[serde(default)]
    pub created_by: String,
    /// Creation time.
    pub created_on: DateTime<Utc>,
}

impl Trigger {
    /// Returns the job template, if the trigger has a non-empty one.
    #[must_use]
    pub fn job_template(&self) -> Option<&JobRequest> {
        self.job.as_ref().filter(|job| !job.is_empty())
    }
}

impl Resource for Trigger {
    const KIND: IdentKind = IdentKind::Trigger;
    const COLLECTION: &'static str = "triggers";

    fn id(&self) -> &Ident {
        &self.trigger_id
    }
}

/// Input for registering a trigger.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTrigger {
    /// Display name.
    pub name: String,
    /// Event type the condition applies to.
    pub event_type_id: Ident,
    /// Condition in the standing-query language.
    #[schema(value_type = Object)]
    pub condition: Value,
    /// Job dispatched when the trigger fires.
    #[serde(default)]
    pub job: Option<JobRequest>,
    /// Whether the trigger starts enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Creator.
    #[serde(default)]
    pub created_by: String,
}

fn default_enabled() -> bool {
    true
}

impl NewTrigger {
    /// Checks the required fields.
    ///
    /// # Errors
    ///
    /// Returns a message if the name, event type or condition is missing.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("trigger name must not be empty".to_string());
        }
        if self.event_type_id.is_empty() {
            return Err("trigger eventTypeId must not be empty".to_string());
        }
        if !self.condition.is_object() {
            return Err("trigger condition must be a JSON object".to_string());
        }
        Ok(())
    }
}

/// Mutable part of a trigger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerUpdate {
    /// New enabled flag.
    pub enabled: bool,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    fn template() -> JobRequest {
        let Ok(job) = serde_json::from_value(json!({
            "createdBy": "ops",
            "jobType": {
                "type": "execute-service",
                "data": {
                    "serviceId": "svc-1",
                    "reading": "$reading",
                    "missing": "$nosuch",
                    "nested": {"site": "$site", "list": ["$reading", 7]}
                }
            }
        })) else {
            panic!("template should deserialize");
        };
        job
    }

    #[test]
    fn render_substitutes_event_fields() {
        let Value::Object(event) = json!({"reading": 100, "site": "lab"}) else {
            panic!("object expected");
        };
        let rendered = template().render(&event);
        let data = &rendered.job_type.data;
        assert_eq!(data.get("serviceId"), Some(&json!("svc-1")));
        assert_eq!(data.get("reading"), Some(&json!(100)));
        assert_eq!(data.get("missing"), Some(&json!("$nosuch")));
        assert_eq!(
            data.get("nested"),
            Some(&json!({"site": "lab", "list": [100, 7]}))
        );
        assert_eq!(rendered.created_by, "ops");
    }

    #[test]
    fn empty_job_type_is_no_template() {
        let mut job = template();
        job.job_type.kind = String::new();
        assert!(job.is_empty());
    }

    #[test]
    fn new_trigger_defaults_to_enabled() {
        let Ok(input) = serde_json::from_value::<NewTrigger>(json!({
            "name": "hot",
            "eventTypeId": "ET1",
            "condition": {"query": {"term": {"reading": 100}}}
        })) else {
            panic!("trigger input should deserialize");
        };
        assert!(input.enabled);
        assert!(input.job.is_none());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn new_trigger_requires_object_condition() {
        let input = NewTrigger {
            name: "hot".to_string(),
            event_type_id: Ident::from("ET1"),
            condition: json!("reading == 100"),
            job: None,
            enabled: true,
            created_by: String::new(),
        };
        assert!(input.validate().is_err());
    }
}
