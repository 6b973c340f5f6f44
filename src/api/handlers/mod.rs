//! REST endpoint handlers organized by resource.

pub mod alert;
pub mod event;
pub mod event_type;
pub mod system;
pub mod trigger;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(event_type::routes())
        .merge(event::routes())
        .merge(trigger::routes())
        .merge(alert::routes())
}
