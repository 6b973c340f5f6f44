//! Per-connection subscription manager.
//!
//! Tracks which triggers and event types a WebSocket client is subscribed
//! to and provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::{Ident, WorkflowEvent};

/// Manages the subscriptions of a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    trigger_ids: HashSet<Ident>,
    event_type_ids: HashSet<Ident>,
    /// Whether the client subscribes to everything (wildcard `"*"`).
    subscribe_all: bool,
    /// Whether the client takes job requests as a worker.
    jobs: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds subscriptions. `"*"` in either list enables the wildcard.
    pub fn subscribe(&mut self, trigger_ids: &[String], event_type_ids: &[String]) {
        for id in trigger_ids {
            if id == "*" {
                self.subscribe_all = true;
            } else {
                self.trigger_ids.insert(Ident::from(id.as_str()));
            }
        }
        for id in event_type_ids {
            if id == "*" {
                self.subscribe_all = true;
            } else {
                self.event_type_ids.insert(Ident::from(id.as_str()));
            }
        }
    }

    /// Opts in to or out of job requests.
    pub fn set_jobs(&mut self, jobs: bool) {
        self.jobs = jobs;
    }

    /// Removes subscriptions. `"*"` clears the wildcard.
    pub fn unsubscribe(&mut self, trigger_ids: &[String], event_type_ids: &[String]) {
        for id in trigger_ids {
            if id == "*" {
                self.subscribe_all = false;
            } else {
                self.trigger_ids.remove(&Ident::from(id.as_str()));
            }
        }
        for id in event_type_ids {
            if id == "*" {
                self.subscribe_all = false;
            } else {
                self.event_type_ids.remove(&Ident::from(id.as_str()));
            }
        }
    }

    /// Returns `true` if the notification matches the subscription filter.
    #[must_use]
    pub fn matches(&self, event: &WorkflowEvent) -> bool {
        if self.jobs && matches!(event, WorkflowEvent::JobRequested { .. }) {
            return true;
        }
        self.subscribe_all
            || self.event_type_ids.contains(event.event_type_id())
            || event
                .trigger_id()
                .is_some_and(|id| self.trigger_ids.contains(id))
    }

    /// Returns the number of explicit subscriptions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.trigger_ids.len() + self.event_type_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }

    /// Returns `true` if the client takes job requests.
    #[must_use]
    pub fn wants_jobs(&self) -> bool {
        self.jobs
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn alert(trigger: &str, event_type: &str) -> WorkflowEvent {
        WorkflowEvent::AlertCreated {
            alert_id: Ident::from("A1"),
            trigger_id: Ident::from(trigger),
            event_id: Ident::from("E1"),
            event_type_id: Ident::from(event_type),
            timestamp: Utc::now(),
        }
    }

    fn ingested(event_type: &str) -> WorkflowEvent {
        WorkflowEvent::EventIngested {
            event_id: Ident::from("E1"),
            event_type_id: Ident::from(event_type),
            alert_ids: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(&alert("T1", "ET1")));
    }

    #[test]
    fn trigger_subscription() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&["T1".to_string()], &[]);
        assert!(mgr.matches(&alert("T1", "ET1")));
        assert!(!mgr.matches(&alert("T2", "ET1")));
        assert!(!mgr.matches(&ingested("ET1")));
    }

    #[test]
    fn event_type_subscription_covers_ingestion() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], &["ET1".to_string()]);
        assert!(mgr.matches(&ingested("ET1")));
        assert!(mgr.matches(&alert("T9", "ET1")));
        assert!(!mgr.matches(&ingested("ET2")));
    }

    #[test]
    fn wildcard_matches_everything_until_cleared() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&["*".to_string()], &[]);
        assert!(mgr.is_subscribed_all());
        assert!(mgr.matches(&ingested("ET5")));
        mgr.unsubscribe(&[], &["*".to_string()]);
        assert!(!mgr.matches(&ingested("ET5")));
    }

    #[test]
    fn job_opt_in_receives_job_requests_only() {
        let job = WorkflowEvent::JobRequested {
            job_id: uuid::Uuid::new_v4(),
            trigger_id: Ident::from("T1"),
            event_id: Ident::from("E1"),
            event_type_id: Ident::from("ET1"),
            job: crate::domain::JobRequest {
                created_by: "ops".to_string(),
                job_type: crate::domain::JobType {
                    kind: "restart".to_string(),
                    data: serde_json::Map::new(),
                },
            },
            timestamp: Utc::now(),
        };
        let mut mgr = SubscriptionManager::new();
        assert!(!mgr.matches(&job));
        mgr.set_jobs(true);
        assert!(mgr.wants_jobs());
        assert!(mgr.matches(&job));
        assert!(!mgr.matches(&alert("T1", "ET1")));
    }

    #[test]
    fn unsubscribe_and_count() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&["T1".to_string(), "T2".to_string()], &["ET1".to_string()]);
        assert_eq!(mgr.count(), 3);
        mgr.unsubscribe(&["T1".to_string()], &[]);
        assert_eq!(mgr.count(), 2);
        assert!(!mgr.matches(&alert("T1", "ET2")));
    }
}
