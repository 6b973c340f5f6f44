//! Trigger registry: compiles conditions and keeps the standing-query
//! index in step with stored triggers.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::{
    EventBus, EventType, Ident, IdentAllocator, IdentKind, NewTrigger, Stats, Trigger,
    TriggerUpdate, WorkflowEvent,
};
use crate::error::WorkflowError;
use crate::store::{Page, Pagination, Percolator, PredicateId, ResourceStore, StandingQuery};

/// CRUD for triggers plus their standing-query registrations.
///
/// A trigger record exists only while its condition is registered with
/// the [`Percolator`] under the record's `percolationId`.
#[derive(Debug)]
pub struct TriggerService {
    triggers: ResourceStore<Trigger>,
    event_types: ResourceStore<EventType>,
    percolator: Arc<dyn Percolator>,
    ids: Arc<IdentAllocator>,
    stats: Arc<Stats>,
    event_bus: EventBus,
    /// Shared with event type deletion.
    references: Arc<RwLock<()>>,
}

impl TriggerService {
    /// Creates a new `TriggerService`.
    #[must_use]
    pub fn new(
        triggers: ResourceStore<Trigger>,
        event_types: ResourceStore<EventType>,
        percolator: Arc<dyn Percolator>,
        ids: Arc<IdentAllocator>,
        stats: Arc<Stats>,
        event_bus: EventBus,
        references: Arc<RwLock<()>>,
    ) -> Self {
        Self {
            triggers,
            event_types,
            percolator,
            ids,
            stats,
            event_bus,
            references,
        }
    }

    /// Compiles, registers and stores a new trigger.
    ///
    /// If storing the record fails after the condition was registered, the
    /// registration is rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Validation`] for missing fields or a
    /// condition that refers to undeclared fields,
    /// [`WorkflowError::InvalidQuery`] if the condition does not compile,
    /// [`WorkflowError::NotFound`] if the event type does not exist, or
    /// [`WorkflowError::Dependency`] on store failure.
    pub async fn post(&self, input: NewTrigger) -> Result<Trigger, WorkflowError> {
        input.validate().map_err(WorkflowError::Validation)?;
        let _references = self.references.read().await;
        let event_type = self.event_types.get_required(&input.event_type_id).await?;

        let compiled = StandingQuery::compile(&input.condition)?;
        let undeclared: Vec<String> = compiled
            .fields()
            .into_iter()
            .filter(|f| !is_declared(&event_type, f))
            .collect();
        if !undeclared.is_empty() {
            return Err(WorkflowError::Validation(format!(
                "condition refers to fields not declared by event type {}: {}",
                event_type.name,
                undeclared.join(", ")
            )));
        }

        let percolation_id = self
            .percolator
            .register_standing_query(event_type.event_type_id.as_str(), &input.condition)
            .await
            .map_err(|e| {
                tracing::error!(event_type_id = %event_type.event_type_id, error = %e, "standing query registration failed");
                WorkflowError::dependency("register standing query", e)
            })?;

        let trigger = Trigger {
            trigger_id: self.ids.next(IdentKind::Trigger),
            name: input.name,
            event_type_id: event_type.event_type_id,
            condition: input.condition,
            job: input.job,
            percolation_id,
            enabled: input.enabled,
            created_by: input.created_by,
            created_on: Utc::now(),
        };

        if let Err(err) = self.triggers.create(&trigger).await {
            self.roll_back(&trigger).await;
            return Err(err);
        }
        self.stats.incr_triggers();

        let _ = self.event_bus.publish(WorkflowEvent::TriggerCreated {
            trigger_id: trigger.trigger_id.clone(),
            event_type_id: trigger.event_type_id.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(trigger_id = %trigger.trigger_id, %percolation_id, "trigger created");
        Ok(trigger)
    }

    async fn roll_back(&self, trigger: &Trigger) {
        match self
            .percolator
            .deregister_standing_query(trigger.percolation_id)
            .await
        {
            Ok(_) => {
                tracing::warn!(trigger_id = %trigger.trigger_id, "trigger not stored; registration rolled back");
            }
            Err(e) => {
                tracing::error!(
                    trigger_id = %trigger.trigger_id,
                    percolation_id = %trigger.percolation_id,
                    error = %e,
                    "rollback of standing query failed; predicate left dangling"
                );
            }
        }
    }

    /// Enables or disables a trigger without touching its registration.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if the trigger does not exist, or
    /// [`WorkflowError::Dependency`] on store failure.
    pub async fn update(&self, id: &Ident, update: TriggerUpdate) -> Result<Trigger, WorkflowError> {
        let mut trigger = self.triggers.get_required(id).await?;
        trigger.enabled = update.enabled;
        if !self.triggers.update(&trigger).await? {
            return Err(WorkflowError::not_found(IdentKind::Trigger, id));
        }
        tracing::info!(trigger_id = %id, enabled = trigger.enabled, "trigger updated");
        Ok(trigger)
    }

    /// Deregisters a trigger's condition, then deletes the record.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if the trigger does not exist,
    /// [`WorkflowError::InconsistentState`] if its condition was not
    /// registered (the record is kept), or [`WorkflowError::Dependency`] on
    /// store failure.
    pub async fn delete(&self, id: &Ident) -> Result<(), WorkflowError> {
        let trigger = self.triggers.get_required(id).await?;

        let found = self
            .percolator
            .deregister_standing_query(trigger.percolation_id)
            .await
            .map_err(|e| {
                tracing::error!(trigger_id = %id, error = %e, "standing query deregistration failed");
                WorkflowError::dependency("deregister standing query", e)
            })?;
        if !found {
            tracing::error!(
                trigger_id = %id,
                percolation_id = %trigger.percolation_id,
                "trigger has no registered standing query"
            );
            return Err(WorkflowError::InconsistentState(format!(
                "standing query {} of trigger {id} is not registered",
                trigger.percolation_id
            )));
        }

        if !self.triggers.delete(id).await? {
            tracing::warn!(trigger_id = %id, "trigger record vanished during delete");
            return Err(WorkflowError::not_found(IdentKind::Trigger, id));
        }

        let _ = self.event_bus.publish(WorkflowEvent::TriggerRemoved {
            trigger_id: trigger.trigger_id,
            event_type_id: trigger.event_type_id,
            timestamp: Utc::now(),
        });
        tracing::info!(trigger_id = %id, "trigger deleted");
        Ok(())
    }

    /// Lists triggers, optionally only those watching one event type.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] on store failure.
    pub async fn get_all(
        &self,
        pagination: &Pagination,
        event_type_id: Option<&Ident>,
    ) -> Result<Page<Trigger>, WorkflowError> {
        match event_type_id {
            Some(et) => {
                self.triggers
                    .search_by_field("eventTypeId", &Value::String(et.to_string()), pagination)
                    .await
            }
            None => self.triggers.list(pagination).await,
        }
    }

    /// Fetches one trigger.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if it does not exist.
    pub async fn get_one(&self, id: &Ident) -> Result<Trigger, WorkflowError> {
        self.triggers.get_required(id).await
    }

    /// Resolves a matched standing query back to its trigger.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] on store failure.
    pub async fn find_by_percolation(
        &self,
        percolation_id: PredicateId,
    ) -> Result<Option<Trigger>, WorkflowError> {
        let page = self
            .triggers
            .search_by_field(
                "percolationId",
                &Value::String(percolation_id.to_string()),
                &Pagination::new(1, 1),
            )
            .await?;
        Ok(page.items.into_iter().next())
    }

    /// Re-registers every stored trigger's condition under its existing
    /// `percolationId` and advances the trigger id counter past them.
    ///
    /// Returns the number of triggers restored.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] if a condition cannot be
    /// registered or the store fails.
    pub async fn restore_predicates(&self) -> Result<usize, WorkflowError> {
        let stored = self.triggers.list(&Pagination::all()).await?;
        for trigger in &stored.items {
            self.ids.observe(IdentKind::Trigger, &trigger.trigger_id);
            self.percolator
                .restore_standing_query(
                    trigger.event_type_id.as_str(),
                    trigger.percolation_id,
                    &trigger.condition,
                )
                .await
                .map_err(|e| {
                    tracing::error!(trigger_id = %trigger.trigger_id, error = %e, "standing query restore failed");
                    WorkflowError::dependency("restore standing query", e)
                })?;
        }
        Ok(stored.items.len())
    }
}

/// A condition field is declared if the mapping names it, or names the
/// top-level object a dotted path starts from.
fn is_declared(event_type: &EventType, field: &str) -> bool {
    event_type.mapping.contains_key(field)
        || field
            .split_once('.')
            .is_some_and(|(root, _)| event_type.mapping.contains_key(root))
}
