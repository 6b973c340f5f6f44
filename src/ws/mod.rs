//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams workflow notifications (ingested
//! events, trigger changes, alerts and job requests) to clients filtered by
//! the trigger and event type ids they subscribe to.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
