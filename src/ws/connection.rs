//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! applying subscription commands and forwarding filtered notifications.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{EventBus, WorkerGuard, WorkflowEvent};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and applies them.
/// - Forwards matching notifications from the bus.
/// - Holds a [`WorkerGuard`] while the client has opted in to jobs.
pub async fn run_connection(socket: WebSocket, event_bus: EventBus) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut event_rx = event_bus.subscribe();
    let mut subs = SubscriptionManager::new();
    let mut worker: Option<WorkerGuard> = None;

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs);
                        sync_worker(&event_bus, &subs, &mut worker);
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(notification) => {
                        if subs.matches(&notification) {
                            let msg = WsMessage::new(
                                uuid::Uuid::new_v4().to_string(),
                                WsMessageType::Event,
                                serde_json::to_value(&notification).unwrap_or_default(),
                            );
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!(worker = worker.is_some(), "ws connection closed");
}

/// Takes or releases the connection's worker registration to follow the
/// client's `jobs` opt-in.
fn sync_worker(event_bus: &EventBus, subs: &SubscriptionManager, worker: &mut Option<WorkerGuard>) {
    match (subs.wants_jobs(), worker.is_some()) {
        (true, false) => *worker = Some(event_bus.register_worker()),
        (false, true) => *worker = None,
        _ => {}
    }
}

/// Handles a text message from the client, returning an optional JSON response.
fn handle_text_message(text: &str, subs: &mut SubscriptionManager) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error("", 400, "malformed JSON")).ok();
    };

    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return serde_json::to_string(&WsMessage::error(msg.id, 404, "unknown command")).ok();
    };

    let response = match command {
        WsCommand::Subscribe {
            trigger_ids,
            event_type_ids,
            jobs,
        } => {
            subs.subscribe(&trigger_ids, &event_type_ids);
            if jobs {
                subs.set_jobs(true);
            }
            tracing::debug!(count = subs.count(), wildcard = subs.is_subscribed_all(), jobs = subs.wants_jobs(), "ws subscribe");
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": { "triggerIds": trigger_ids, "eventTypeIds": event_type_ids },
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                    "jobs": subs.wants_jobs(),
                }),
            )
        }
        WsCommand::Unsubscribe {
            trigger_ids,
            event_type_ids,
            jobs,
        } => {
            subs.unsubscribe(&trigger_ids, &event_type_ids);
            if jobs {
                subs.set_jobs(false);
            }
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": { "triggerIds": trigger_ids, "eventTypeIds": event_type_ids },
                    "remainingCount": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                    "jobs": subs.wants_jobs(),
                }),
            )
        }
    };
    serde_json::to_string(&response).ok()
}
