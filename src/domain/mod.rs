//! Domain layer: resource types, identifiers, counters and the event bus.
//!
//! This module contains the server-side domain model: the four stored
//! resources (event types, events, triggers, alerts), the identifier
//! allocator that names them, process-wide activity counters, and the
//! event bus that broadcasts state changes.

pub mod alert;
pub mod event;
pub mod event_bus;
pub mod event_type;
pub mod ident;
pub mod stats;
pub mod trigger;
pub mod workflow_event;

pub use alert::{Alert, NewAlert};
pub use event::{Event, NewEvent};
pub use event_bus::{EventBus, WorkerGuard};
pub use event_type::{EventType, FieldKind, NewEventType};
pub use ident::{Ident, IdentAllocator, IdentKind};
pub use stats::{Stats, StatsSnapshot};
pub use trigger::{JobRequest, JobType, NewTrigger, Trigger, TriggerUpdate};
pub use workflow_event::WorkflowEvent;
