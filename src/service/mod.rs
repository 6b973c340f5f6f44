//! Service layer: orchestrates registries, matching and notifications.
//!
//! Services own typed resource stores and the standing-query index, and
//! emit [`crate::domain::WorkflowEvent`]s after every mutation.

pub mod alert_service;
pub mod event_service;
pub mod event_type_service;
pub mod job_dispatcher;
pub mod trigger_service;

pub use alert_service::AlertService;
pub use event_service::{EventService, Ingestion};
pub use event_type_service::EventTypeService;
pub use job_dispatcher::{BusJobDispatcher, DispatchError, JobDispatcher};
pub use trigger_service::TriggerService;
