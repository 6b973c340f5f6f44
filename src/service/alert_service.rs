//! Alert registry.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::domain::{
    Alert, Event, EventBus, Ident, IdentAllocator, IdentKind, NewAlert, Stats, Trigger,
    WorkflowEvent,
};
use crate::error::WorkflowError;
use crate::store::{Page, Pagination, ResourceStore};

/// CRUD and query access to alerts.
#[derive(Debug)]
pub struct AlertService {
    alerts: ResourceStore<Alert>,
    triggers: ResourceStore<Trigger>,
    events: ResourceStore<Event>,
    ids: Arc<IdentAllocator>,
    stats: Arc<Stats>,
    event_bus: EventBus,
}

impl AlertService {
    /// Creates a new `AlertService`.
    #[must_use]
    pub fn new(
        alerts: ResourceStore<Alert>,
        triggers: ResourceStore<Trigger>,
        events: ResourceStore<Event>,
        ids: Arc<IdentAllocator>,
        stats: Arc<Stats>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            alerts,
            triggers,
            events,
            ids,
            stats,
            event_bus,
        }
    }

    /// Stores the alert for one (trigger, event) match.
    ///
    /// An empty `created_by` attributes the alert to the trigger's owner.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] on store failure.
    pub async fn record(
        &self,
        trigger: &Trigger,
        event: &Event,
        job_id: Option<String>,
        created_by: String,
    ) -> Result<Alert, WorkflowError> {
        let created_by = if created_by.is_empty() {
            trigger.created_by.clone()
        } else {
            created_by
        };
        let alert = Alert {
            alert_id: self.ids.next(IdentKind::Alert),
            trigger_id: trigger.trigger_id.clone(),
            event_id: event.event_id.clone(),
            job_id,
            created_by,
            created_on: Utc::now(),
        };
        self.alerts.create(&alert).await?;
        self.stats.incr_alerts();

        let _ = self.event_bus.publish(WorkflowEvent::AlertCreated {
            alert_id: alert.alert_id.clone(),
            trigger_id: alert.trigger_id.clone(),
            event_id: alert.event_id.clone(),
            event_type_id: event.event_type_id.clone(),
            timestamp: alert.created_on,
        });

        tracing::info!(
            alert_id = %alert.alert_id,
            trigger_id = %alert.trigger_id,
            event_id = %alert.event_id,
            "alert created"
        );
        Ok(alert)
    }

    /// Creates an alert by hand. The trigger and event must exist.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if the trigger or event does not
    /// exist, or [`WorkflowError::Dependency`] on store failure.
    pub async fn post(&self, input: NewAlert) -> Result<Alert, WorkflowError> {
        let trigger = self.triggers.get_required(&input.trigger_id).await?;
        let event = self.events.get_required(&input.event_id).await?;
        self.record(&trigger, &event, input.job_id, input.created_by)
            .await
    }

    /// Lists alerts.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] on store failure.
    pub async fn get_all(&self, pagination: &Pagination) -> Result<Page<Alert>, WorkflowError> {
        self.alerts.list(pagination).await
    }

    /// Lists alerts raised by one trigger, by exact match on `triggerId`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] on store failure.
    pub async fn get_all_by_trigger(
        &self,
        trigger_id: &Ident,
        pagination: &Pagination,
    ) -> Result<Page<Alert>, WorkflowError> {
        self.alerts
            .search_by_field("triggerId", &Value::String(trigger_id.to_string()), pagination)
            .await
    }

    /// Fetches one alert.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if it does not exist.
    pub async fn get_one(&self, id: &Ident) -> Result<Alert, WorkflowError> {
        self.alerts.get_required(id).await
    }

    /// Deletes an alert.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if it does not exist, or
    /// [`WorkflowError::Dependency`] on store failure.
    pub async fn delete(&self, id: &Ident) -> Result<(), WorkflowError> {
        if !self.alerts.delete(id).await? {
            return Err(WorkflowError::not_found(IdentKind::Alert, id));
        }
        tracing::info!(alert_id = %id, "alert deleted");
        Ok(())
    }

    /// Searches alerts with a raw query.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidQuery`] if the query does not
    /// compile, or [`WorkflowError::Dependency`] on store failure.
    pub async fn query(
        &self,
        query: &Value,
        pagination: &Pagination,
    ) -> Result<Page<Alert>, WorkflowError> {
        self.alerts.search_by_query(query, pagination).await
    }
}
