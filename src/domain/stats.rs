//! Process-wide activity counters.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Monotonic counters, one per kind of successful creation.
///
/// Counters are never decremented; deleting a resource does not undo its
/// count.
#[derive(Debug)]
pub struct Stats {
    created_on: DateTime<Utc>,
    event_types: AtomicU64,
    events: AtomicU64,
    triggers: AtomicU64,
    alerts: AtomicU64,
    triggered_jobs: AtomicU64,
}

impl Stats {
    /// Creates zeroed counters stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            created_on: Utc::now(),
            event_types: AtomicU64::new(0),
            events: AtomicU64::new(0),
            triggers: AtomicU64::new(0),
            alerts: AtomicU64::new(0),
            triggered_jobs: AtomicU64::new(0),
        }
    }

    /// Counts a created event type.
    pub fn incr_event_types(&self) {
        self.event_types.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a created event.
    pub fn incr_events(&self) {
        self.events.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a created trigger.
    pub fn incr_triggers(&self) {
        self.triggers.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a created alert.
    pub fn incr_alerts(&self) {
        self.alerts.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a dispatched job.
    pub fn incr_triggered_jobs(&self) {
        self.triggered_jobs.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            created_on: self.created_on,
            num_event_types: self.event_types.load(Ordering::Relaxed),
            num_events: self.events.load(Ordering::Relaxed),
            num_triggers: self.triggers.load(Ordering::Relaxed),
            num_alerts: self.alerts.load(Ordering::Relaxed),
            num_triggered_jobs: self.triggered_jobs.load(Ordering::Relaxed),
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`Stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// When counting started.
    pub created_on: DateTime<Utc>,
    /// Event types created.
    pub num_event_types: u64,
    /// Events created.
    pub num_events: u64,
    /// Triggers created.
    pub num_triggers: u64,
    /// Alerts created.
    pub num_alerts: u64,
    /// Jobs dispatched.
    pub num_triggered_jobs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_independent() {
        let stats = Stats::new();
        stats.incr_events();
        stats.incr_events();
        stats.incr_alerts();
        let snap = stats.snapshot();
        assert_eq!(snap.num_events, 2);
        assert_eq!(snap.num_alerts, 1);
        assert_eq!(snap.num_triggers, 0);
        assert_eq!(snap.num_triggered_jobs, 0);
    }

    #[test]
    fn snapshot_is_camel_case() {
        let json = serde_json::to_string(&Stats::new().snapshot()).unwrap_or_default();
        assert!(json.contains("numTriggeredJobs"));
        assert!(json.contains("createdOn"));
    }
}
