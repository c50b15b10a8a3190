//! Job lifecycle types.
//!
//! The job state machine:
//!
//! ```text
//!   Initializing ──submit()──→ Queued ──→ Running ──→ Completed
//!                                │           │
//!                                │           ├──→ Failed(reason)
//!                                │           │
//!                                └───────────┴──→ Cancelled
//! ```
//!
//! **Invariants:**
//! - A job without a server-assigned id is `Initializing`.
//! - Transitions are monotonic: a job never moves backward.
//! - Terminal states (`Completed`, `Failed`, `Cancelled`) are permanent, so
//!   implementations may cache them and stop polling.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::error::HalError;
use crate::result::ExecutionResult;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Job exists client-side only; it has no server id yet.
    Initializing,
    /// Job is waiting in queue.
    Queued,
    /// Job is currently running.
    Running,
    /// Job completed successfully.
    Completed,
    /// Job failed with an error message.
    Failed(String),
    /// Job was cancelled.
    Cancelled,
}

impl JobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }

    /// Check if the job is still pending (queued or running).
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    /// Check if the job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Initializing => write!(f, "Initializing"),
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed(msg) => write!(f, "Failed: {msg}"),
            JobStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A handle on one job, driven by a single caller.
///
/// Adapters implement the lifecycle methods with their own error type; that
/// type must absorb [`HalError`] so the provided
/// [`wait_for_final_state`](Self::wait_for_final_state) can report a timeout.
#[async_trait]
pub trait JobHandle: Send {
    /// Adapter error type.
    type Error: From<HalError> + Send;

    /// Server-assigned id, if the job has been submitted.
    fn job_id(&self) -> Option<&JobId>;

    /// Submit the job to the backend.
    async fn submit(&mut self) -> Result<(), Self::Error>;

    /// Current status of the job.
    async fn status(&mut self) -> Result<JobStatus, Self::Error>;

    /// Wait for the job to finish and return its result.
    async fn result(&mut self) -> Result<ExecutionResult, Self::Error>;

    /// Ask the backend to cancel the job.
    async fn cancel(&mut self) -> Result<(), Self::Error>;

    /// Poll [`status`](Self::status) until the job reaches a terminal state.
    ///
    /// With `timeout` set, gives up with [`HalError::Timeout`] once that much
    /// time has elapsed without a terminal status. `None` waits indefinitely.
    async fn wait_for_final_state(
        &mut self,
        timeout: Option<Duration>,
        poll_interval: Duration,
    ) -> Result<JobStatus, Self::Error> {
        let started = Instant::now();

        loop {
            let status = self.status().await?;
            if status.is_terminal() {
                return Ok(status);
            }

            let mut delay = poll_interval;
            if let Some(limit) = timeout {
                let elapsed = started.elapsed();
                if elapsed >= limit {
                    let id = self
                        .job_id()
                        .map_or_else(|| "<unsubmitted>".to_string(), ToString::to_string);
                    return Err(HalError::Timeout(id).into());
                }
                delay = delay.min(limit - elapsed);
            }

            debug!("Job status {}, polling again in {:?}", status, delay);
            sleep(delay).await;
        }
    }
}
