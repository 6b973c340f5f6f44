//! Event type registry.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{Event, EventType, Ident, IdentAllocator, IdentKind, NewEventType, Stats, Trigger};
use crate::error::WorkflowError;
use crate::store::{Page, Pagination, ResourceStore};

/// CRUD for event schemas.
///
/// Names are unique: creation holds an in-process lock across the name
/// check and the insert. Deletion is refused while any event or trigger
/// still refers to the type; it holds `references` exclusively so no such
/// record can be written between the check and the delete.
#[derive(Debug)]
pub struct EventTypeService {
    event_types: ResourceStore<EventType>,
    events: ResourceStore<Event>,
    triggers: ResourceStore<Trigger>,
    ids: Arc<IdentAllocator>,
    stats: Arc<Stats>,
    create_lock: Mutex<()>,
    references: Arc<RwLock<()>>,
}

impl EventTypeService {
    /// Creates a new `EventTypeService`.
    #[must_use]
    pub fn new(
        event_types: ResourceStore<EventType>,
        events: ResourceStore<Event>,
        triggers: ResourceStore<Trigger>,
        ids: Arc<IdentAllocator>,
        stats: Arc<Stats>,
        references: Arc<RwLock<()>>,
    ) -> Self {
        Self {
            event_types,
            events,
            triggers,
            ids,
            stats,
            create_lock: Mutex::new(()),
            references,
        }
    }

    /// Registers a new event type.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Validation`] for an empty name or mapping,
    /// [`WorkflowError::Conflict`] if the name is taken, or
    /// [`WorkflowError::Dependency`] on store failure.
    pub async fn post(&self, input: NewEventType) -> Result<EventType, WorkflowError> {
        input.validate().map_err(WorkflowError::Validation)?;
        let name = input.name.trim().to_string();

        let _guard = self.create_lock.lock().await;
        if self.get_by_name(&name).await?.is_some() {
            return Err(WorkflowError::Conflict(format!(
                "event type name {name:?} is already registered"
            )));
        }

        let event_type = EventType {
            event_type_id: self.ids.next(IdentKind::EventType),
            name,
            mapping: input.mapping,
            created_by: input.created_by,
            created_on: Utc::now(),
        };
        self.event_types.create(&event_type).await?;
        self.stats.incr_event_types();

        tracing::info!(event_type_id = %event_type.event_type_id, name = %event_type.name, "event type created");
        Ok(event_type)
    }

    /// Lists event types.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] on store failure.
    pub async fn get_all(&self, pagination: &Pagination) -> Result<Page<EventType>, WorkflowError> {
        self.event_types.list(pagination).await
    }

    /// Fetches one event type.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if it does not exist.
    pub async fn get_one(&self, id: &Ident) -> Result<EventType, WorkflowError> {
        self.event_types.get_required(id).await
    }

    /// Looks an event type up by its unique name.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] on store failure.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<EventType>, WorkflowError> {
        let page = self
            .event_types
            .search_by_field("name", &Value::String(name.to_string()), &Pagination::new(1, 1))
            .await?;
        Ok(page.items.into_iter().next())
    }

    /// Deletes an event type that nothing refers to.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if it does not exist,
    /// [`WorkflowError::Conflict`] if events or triggers still refer to it,
    /// or [`WorkflowError::Dependency`] on store failure.
    pub async fn delete(&self, id: &Ident) -> Result<(), WorkflowError> {
        let _guard = self.references.write().await;
        self.get_one(id).await?;

        let key = Value::String(id.to_string());
        let first = Pagination::new(1, 1);
        let triggers = self.triggers.search_by_field("eventTypeId", &key, &first).await?;
        let events = self.events.search_by_field("eventTypeId", &key, &first).await?;
        if triggers.total > 0 || events.total > 0 {
            return Err(WorkflowError::Conflict(format!(
                "event type {id} is referenced by {} trigger(s) and {} event(s)",
                triggers.total, events.total
            )));
        }

        if !self.event_types.delete(id).await? {
            return Err(WorkflowError::not_found(IdentKind::EventType, id));
        }
        tracing::info!(event_type_id = %id, "event type deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::app_state::AppState;
    use crate::config::WorkflowConfig;
    use crate::domain::FieldKind;
    use crate::store::PredicateId;

    async fn login_type(state: &AppState) -> EventType {
        let Ok(event_type) = state
            .event_types
            .post(NewEventType {
                name: "Login".to_string(),
                mapping: BTreeMap::from([("host".to_string(), FieldKind::String)]),
                created_by: "ops".to_string(),
            })
            .await
        else {
            panic!("event type should register");
        };
        event_type
    }

    #[tokio::test]
    async fn unreferenced_type_is_deleted() {
        let state = AppState::in_memory(&WorkflowConfig::default());
        let event_type = login_type(&state).await;

        assert!(state.event_types.delete(&event_type.event_type_id).await.is_ok());
        assert!(matches!(
            state.event_types.get_one(&event_type.event_type_id).await,
            Err(WorkflowError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn delete_waits_for_in_flight_reference_writes() {
        let state = AppState::in_memory(&WorkflowConfig::default());
        let event_type = login_type(&state).await;
        let service = Arc::clone(&state.event_types);

        // stands in for a trigger write that already passed its type lookup
        let writing = service.references.read().await;
        let id = event_type.event_type_id.clone();
        let deleting = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.delete(&id).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!deleting.is_finished());

        let trigger = Trigger {
            trigger_id: Ident::from("T1"),
            name: "watch".to_string(),
            event_type_id: event_type.event_type_id.clone(),
            condition: json!({"term": {"host": "db1"}}),
            job: None,
            percolation_id: PredicateId::new(),
            enabled: true,
            created_by: "ops".to_string(),
            created_on: Utc::now(),
        };
        assert!(service.triggers.create(&trigger).await.is_ok());
        drop(writing);

        let Ok(result) = deleting.await else {
            panic!("delete task panicked");
        };
        assert!(matches!(result, Err(WorkflowError::Conflict(_))));
        assert!(service.get_one(&event_type.event_type_id).await.is_ok());
    }
}
