//! Event ingestion and matching.
//!
//! Ingestion stores the event first, then asks the [`Percolator`] which
//! standing queries in the event's type scope the event satisfies, then
//! records one alert per enabled matching trigger. Job dispatch for a
//! trigger happens before its alert is written so the alert can carry the
//! job id; a failed dispatch is logged and the alert is written without one.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::alert_service::AlertService;
use super::job_dispatcher::JobDispatcher;
use super::trigger_service::TriggerService;
use crate::domain::event::validate_cron;
use crate::domain::{
    Event, EventBus, EventType, Ident, IdentAllocator, IdentKind, NewEvent, Stats, Trigger,
    WorkflowEvent,
};
use crate::error::WorkflowError;
use crate::store::{Page, Pagination, Percolator, ResourceStore};

/// Result of ingesting one event.
#[derive(Debug, Clone)]
pub struct Ingestion {
    /// The stored event.
    pub event: Event,
    /// Alerts created for it, in trigger registration order.
    pub alert_ids: Vec<Ident>,
}

/// Accepts events and turns matches into alerts.
#[derive(Debug)]
pub struct EventService {
    events: ResourceStore<Event>,
    event_types: ResourceStore<EventType>,
    triggers: Arc<TriggerService>,
    alerts: Arc<AlertService>,
    percolator: Arc<dyn Percolator>,
    dispatcher: Option<Arc<dyn JobDispatcher>>,
    ids: Arc<IdentAllocator>,
    stats: Arc<Stats>,
    event_bus: EventBus,
    /// Shared with event type deletion.
    references: Arc<RwLock<()>>,
}

impl EventService {
    /// Creates a new `EventService`. With no dispatcher, triggers never
    /// start jobs.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        events: ResourceStore<Event>,
        event_types: ResourceStore<EventType>,
        triggers: Arc<TriggerService>,
        alerts: Arc<AlertService>,
        percolator: Arc<dyn Percolator>,
        dispatcher: Option<Arc<dyn JobDispatcher>>,
        ids: Arc<IdentAllocator>,
        stats: Arc<Stats>,
        event_bus: EventBus,
        references: Arc<RwLock<()>>,
    ) -> Self {
        Self {
            events,
            event_types,
            triggers,
            alerts,
            percolator,
            dispatcher,
            ids,
            stats,
            event_bus,
            references,
        }
    }

    /// Validates, stores and matches an event.
    ///
    /// Events carrying a `cronSchedule` are stored as templates and not
    /// matched.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Validation`] if the data does not conform to
    /// the event type, [`WorkflowError::NotFound`] if the event type does
    /// not exist, or [`WorkflowError::Dependency`] on store failure.
    pub async fn ingest(&self, input: NewEvent) -> Result<Ingestion, WorkflowError> {
        let references = self.references.read().await;
        let event_type = self.resolve_event_type(&input).await?;
        event_type
            .validate_data(&input.data)
            .map_err(WorkflowError::Validation)?;
        let cron_schedule = match input.cron_schedule {
            Some(expr) if !expr.trim().is_empty() => {
                validate_cron(&expr).map_err(WorkflowError::Validation)?;
                Some(expr.trim().to_string())
            }
            _ => None,
        };

        let event = Event {
            event_id: self.ids.next(IdentKind::Event),
            event_type_id: event_type.event_type_id,
            data: input.data,
            created_by: input.created_by,
            created_on: Utc::now(),
            cron_schedule,
        };
        self.events.create(&event).await?;
        drop(references);
        self.stats.incr_events();

        let alert_ids = if event.is_scheduled() {
            tracing::info!(event_id = %event.event_id, "scheduled event stored; not matched");
            Vec::new()
        } else {
            self.fire_matches(&event).await?
        };

        let _ = self.event_bus.publish(WorkflowEvent::EventIngested {
            event_id: event.event_id.clone(),
            event_type_id: event.event_type_id.clone(),
            alert_ids: alert_ids.clone(),
            timestamp: Utc::now(),
        });
        tracing::info!(
            event_id = %event.event_id,
            event_type_id = %event.event_type_id,
            alerts = alert_ids.len(),
            "event ingested"
        );
        Ok(Ingestion { event, alert_ids })
    }

    async fn resolve_event_type(&self, input: &NewEvent) -> Result<EventType, WorkflowError> {
        if let Some(id) = input.event_type_id.as_ref().filter(|id| !id.is_empty()) {
            return self.event_types.get_required(id).await;
        }
        let Some(name) = input.event_type_name.as_deref().map(str::trim).filter(|n| !n.is_empty())
        else {
            return Err(WorkflowError::Validation(
                "event must name its type with eventTypeId or eventTypeName".to_string(),
            ));
        };
        let page = self
            .event_types
            .search_by_field("name", &Value::String(name.to_string()), &Pagination::new(1, 1))
            .await?;
        page.items
            .into_iter()
            .next()
            .ok_or_else(|| WorkflowError::not_found(IdentKind::EventType, &Ident::new(name)))
    }

    async fn fire_matches(&self, event: &Event) -> Result<Vec<Ident>, WorkflowError> {
        let document = Value::Object(event.data.clone());
        let matched = self
            .percolator
            .match_document(event.event_type_id.as_str(), &document)
            .await
            .map_err(|e| {
                tracing::error!(event_id = %event.event_id, error = %e, "standing query match failed");
                WorkflowError::dependency("match document", e)
            })?;

        let mut alert_ids = Vec::with_capacity(matched.len());
        for percolation_id in matched {
            let Some(trigger) = self.triggers.find_by_percolation(percolation_id).await? else {
                tracing::warn!(%percolation_id, event_id = %event.event_id, "matched standing query has no trigger; skipped");
                continue;
            };
            if !trigger.enabled {
                tracing::debug!(trigger_id = %trigger.trigger_id, "trigger disabled; no alert");
                continue;
            }
            let job_id = self.dispatch_job(&trigger, event);
            let alert = self
                .alerts
                .record(&trigger, event, job_id, String::new())
                .await?;
            alert_ids.push(alert.alert_id);
        }
        Ok(alert_ids)
    }

    fn dispatch_job(&self, trigger: &Trigger, event: &Event) -> Option<String> {
        let dispatcher = self.dispatcher.as_ref()?;
        let template = trigger.job_template()?;
        match dispatcher.dispatch(trigger, event, template.render(&event.data)) {
            Ok(job_id) => {
                self.stats.incr_triggered_jobs();
                Some(job_id.to_string())
            }
            Err(e) => {
                tracing::warn!(trigger_id = %trigger.trigger_id, event_id = %event.event_id, error = %e, "job dispatch failed");
                None
            }
        }
    }

    /// Lists events, optionally only those of one event type.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] on store failure.
    pub async fn get_all(
        &self,
        pagination: &Pagination,
        event_type_id: Option<&Ident>,
    ) -> Result<Page<Event>, WorkflowError> {
        match event_type_id {
            Some(et) => {
                self.events
                    .search_by_field("eventTypeId", &Value::String(et.to_string()), pagination)
                    .await
            }
            None => self.events.list(pagination).await,
        }
    }

    /// Fetches one event.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if it does not exist.
    pub async fn get_one(&self, id: &Ident) -> Result<Event, WorkflowError> {
        self.events.get_required(id).await
    }

    /// Deletes an event. Alerts referring to it are kept.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if it does not exist, or
    /// [`WorkflowError::Dependency`] on store failure.
    pub async fn delete(&self, id: &Ident) -> Result<(), WorkflowError> {
        if !self.events.delete(id).await? {
            return Err(WorkflowError::not_found(IdentKind::Event, id));
        }
        tracing::info!(event_id = %id, "event deleted");
        Ok(())
    }

    /// Searches events with a raw query over the stored documents.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidQuery`] if the query does not
    /// compile, or [`WorkflowError::Dependency`] on store failure.
    pub async fn query(
        &self,
        query: &Value,
        pagination: &Pagination,
    ) -> Result<Page<Event>, WorkflowError> {
        self.events.search_by_query(query, pagination).await
    }
}
