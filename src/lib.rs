//! # workflow-gateway
//!
//! REST API and WebSocket gateway for an event-condition-action engine.
//!
//! Clients register event types (named field schemas), attach triggers to
//! them (standing conditions in a JSON query language), and post events.
//! Every event is validated against its type, stored, and matched against
//! the registered conditions of that type; each enabled trigger it
//! satisfies yields an alert and, when the trigger carries a job template,
//! a job request for downstream workers.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── EventType / Trigger / Event / Alert services (service/)
//!     ├── EventBus, Stats, IdentAllocator (domain/)
//!     │
//!     ├── PredicateIndex (store/, standing-query matching)
//!     │
//!     └── DocumentStore (in-memory or PostgreSQL)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod store;
pub mod ws;
