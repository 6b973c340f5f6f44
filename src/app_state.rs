//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::WorkflowConfig;
use crate::domain::{EventBus, IdentAllocator, IdentKind, Stats};
use crate::error::WorkflowError;
use crate::service::{
    AlertService, BusJobDispatcher, EventService, EventTypeService, JobDispatcher, TriggerService,
};
use crate::store::{
    DocumentStore, MemoryDocumentStore, Pagination, Percolator, PredicateIndex, ResourceStore,
};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event type registry.
    pub event_types: Arc<EventTypeService>,
    /// Trigger registry.
    pub triggers: Arc<TriggerService>,
    /// Event ingestion and matching.
    pub events: Arc<EventService>,
    /// Alert registry.
    pub alerts: Arc<AlertService>,
    /// Activity counters.
    pub stats: Arc<Stats>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Identifier allocator shared by all services.
    pub ids: Arc<IdentAllocator>,
    /// Upper bound on `perPage`.
    pub max_page_size: u32,
}

impl AppState {
    /// Wires every service over the given document store and matching
    /// service.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        percolator: Arc<dyn Percolator>,
        config: &WorkflowConfig,
    ) -> Self {
        let ids = Arc::new(IdentAllocator::new());
        let stats = Arc::new(Stats::new());
        let event_bus = EventBus::new(config.event_bus_capacity);

        let event_type_store = ResourceStore::new(Arc::clone(&store));
        let event_store = ResourceStore::new(Arc::clone(&store));
        let trigger_store = ResourceStore::new(Arc::clone(&store));
        let alert_store = ResourceStore::new(store);
        let references = Arc::new(RwLock::new(()));

        let event_types = Arc::new(EventTypeService::new(
            event_type_store.clone(),
            event_store.clone(),
            trigger_store.clone(),
            Arc::clone(&ids),
            Arc::clone(&stats),
            Arc::clone(&references),
        ));
        let triggers = Arc::new(TriggerService::new(
            trigger_store.clone(),
            event_type_store.clone(),
            Arc::clone(&percolator),
            Arc::clone(&ids),
            Arc::clone(&stats),
            event_bus.clone(),
            Arc::clone(&references),
        ));
        let alerts = Arc::new(AlertService::new(
            alert_store,
            trigger_store,
            event_store.clone(),
            Arc::clone(&ids),
            Arc::clone(&stats),
            event_bus.clone(),
        ));

        let dispatcher: Option<Arc<dyn JobDispatcher>> = if config.job_dispatch_enabled {
            Some(Arc::new(BusJobDispatcher::new(event_bus.clone())))
        } else {
            None
        };
        let events = Arc::new(EventService::new(
            event_store,
            event_type_store,
            Arc::clone(&triggers),
            Arc::clone(&alerts),
            percolator,
            dispatcher,
            Arc::clone(&ids),
            Arc::clone(&stats),
            event_bus.clone(),
            references,
        ));

        Self {
            event_types,
            triggers,
            events,
            alerts,
            stats,
            event_bus,
            ids,
            max_page_size: config.max_page_size,
        }
    }

    /// State backed by the in-memory store and the embedded predicate
    /// index.
    #[must_use]
    pub fn in_memory(config: &WorkflowConfig) -> Self {
        Self::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(PredicateIndex::new()),
            config,
        )
    }

    /// Brings in-process state in line with a store that already holds
    /// documents: advances the identifier counters past every stored id and
    /// re-registers every stored trigger's condition.
    ///
    /// Returns the number of triggers restored.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] if the store cannot be read or
    /// a condition cannot be registered.
    pub async fn recover(&self) -> Result<usize, WorkflowError> {
        let all = Pagination::all();

        for event_type in self.event_types.get_all(&all).await?.items {
            self.ids.observe(IdentKind::EventType, &event_type.event_type_id);
        }
        for event in self.events.get_all(&all, None).await?.items {
            self.ids.observe(IdentKind::Event, &event.event_id);
        }
        for alert in self.alerts.get_all(&all).await?.items {
            self.ids.observe(IdentKind::Alert, &alert.alert_id);
        }
        let restored = self.triggers.restore_predicates().await?;

        tracing::info!(triggers = restored, "state recovered from document store");
        Ok(restored)
    }
}
