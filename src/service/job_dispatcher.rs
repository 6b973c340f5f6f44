//! Downstream job dispatch seam.

use std::fmt;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Event, EventBus, JobRequest, Trigger, WorkflowEvent};

/// Failure to hand a job to downstream workers. Never fatal to alert
/// creation.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Nothing is listening for job requests.
    #[error("no workers are subscribed to job requests")]
    NoWorkers,

    /// The dispatcher refused the request.
    #[error("job rejected: {0}")]
    Rejected(String),
}

/// Submits rendered job requests to whatever runs them.
pub trait JobDispatcher: Send + Sync + fmt::Debug {
    /// Hands off `job` for the given match and returns the job id.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] if the job could not be handed off.
    fn dispatch(&self, trigger: &Trigger, event: &Event, job: JobRequest)
    -> Result<Uuid, DispatchError>;
}

/// Publishes job requests on the [`EventBus`] for workers connected over
/// the WebSocket stream. Only connections that subscribed with `jobs`
/// count as workers; plain notification listeners do not.
#[derive(Debug, Clone)]
pub struct BusJobDispatcher {
    event_bus: EventBus,
}

impl BusJobDispatcher {
    /// Creates a dispatcher publishing on `event_bus`.
    #[must_use]
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

impl JobDispatcher for BusJobDispatcher {
    fn dispatch(
        &self,
        trigger: &Trigger,
        event: &Event,
        job: JobRequest,
    ) -> Result<Uuid, DispatchError> {
        if self.event_bus.worker_count() == 0 {
            return Err(DispatchError::NoWorkers);
        }
        let job_id = Uuid::new_v4();
        let delivered = self.event_bus.publish(WorkflowEvent::JobRequested {
            job_id,
            trigger_id: trigger.trigger_id.clone(),
            event_id: event.event_id.clone(),
            event_type_id: event.event_type_id.clone(),
            job,
            timestamp: Utc::now(),
        });
        if delivered == 0 {
            return Err(DispatchError::NoWorkers);
        }
        tracing::debug!(%job_id, trigger_id = %trigger.trigger_id, "job requested");
        Ok(job_id)
    }
}
