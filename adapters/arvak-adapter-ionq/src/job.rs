//! IonQ job handle.
//!
//! ```text
//!   from_circuit ──submit()──→ Queued ──→ Running ──→ Completed
//!   (Initializing)                │           ├──→ Failed
//!                                 └───────────┴──→ Cancelled
//!   from_id ── first status() fetches ──→ any of the above
//! ```
//!
//! Status is fetched lazily. A job without an id reports `Initializing`
//! without touching the network, and a terminal status is cached so that
//! later calls are free.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument};

use arvak_hal::{
    Backend, ExecutionResult, ExperimentResult, HalError, JobHandle, JobId, JobStatus,
};
use arvak_ir::Circuit;

use crate::api::IonQApi;
use crate::backend::IonQBackend;
use crate::error::{IonQError, IonQResult};
use crate::remap::{remap_counts, shots_from_metadata};
use crate::serialize::circuit_to_ionq;

/// Poll interval used by [`IonQJob::result`](JobHandle::result) unless overridden.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A job on an IonQ backend.
pub struct IonQJob {
    api: Arc<dyn IonQApi>,
    backend_name: String,
    backend_version: String,
    target: String,
    job_id: Option<JobId>,
    circuit: Option<Circuit>,
    shots: u32,
    status: JobStatus,
    /// Raw job document, kept once the job has completed.
    result_doc: Option<Value>,
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl std::fmt::Debug for IonQJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IonQJob")
            .field("backend", &self.backend_name)
            .field("job_id", &self.job_id)
            .field("status", &self.status)
            .field("shots", &self.shots)
            .finish_non_exhaustive()
    }
}

impl IonQJob {
    fn new(backend: &IonQBackend, job_id: Option<JobId>, circuit: Option<Circuit>, shots: u32) -> Self {
        Self {
            api: backend.api(),
            backend_name: backend.name().to_string(),
            backend_version: backend.version().to_string(),
            target: backend.target().to_string(),
            job_id,
            circuit,
            shots,
            status: JobStatus::Initializing,
            result_doc: None,
            timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Handle on an existing job.
    pub fn from_id(backend: &IonQBackend, job_id: impl Into<JobId>) -> Self {
        Self::new(backend, Some(job_id.into()), None, backend.default_shots())
    }

    /// New, unsubmitted job for `circuit`.
    pub fn from_circuit(backend: &IonQBackend, circuit: Circuit, shots: u32) -> Self {
        Self::new(backend, None, Some(circuit), shots)
    }

    /// Give up waiting for results after `timeout`; `None` waits forever.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn circuit(&self) -> Option<&Circuit> {
        self.circuit.as_ref()
    }

    pub fn shots(&self) -> u32 {
        self.shots
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// Last known status, without polling.
    pub fn cached_status(&self) -> &JobStatus {
        &self.status
    }

    /// Raw job document of a completed job.
    pub fn raw_result(&self) -> Option<&Value> {
        self.result_doc.as_ref()
    }

    fn require_id(&self, action: &str) -> IonQResult<&JobId> {
        self.job_id.as_ref().ok_or_else(|| {
            IonQError::JobError(format!(
                "Cannot {action} a job that has not been submitted."
            ))
        })
    }

    /// Delete the job and its data on the server.
    #[instrument(skip(self), fields(job_id = ?self.job_id))]
    pub async fn delete(&mut self) -> IonQResult<()> {
        let id = self.require_id("delete")?;
        self.api.delete_job(&id.0).await?;
        Ok(())
    }

    fn build_result(&self, job_id: JobId) -> IonQResult<ExecutionResult> {
        let doc = self.result_doc.as_ref();
        let counts = remap_counts(doc)?;

        let metadata = doc.and_then(|d| d.get("metadata"));
        let shots = match metadata {
            Some(m) => shots_from_metadata(m)?,
            None => u64::from(self.shots),
        };
        let shots = u32::try_from(shots)
            .map_err(|_| IonQError::JobError(format!("Shot count {shots} out of range")))?;

        let qobj_id = doc
            .and_then(|d| d.get("qobj_id"))
            .or_else(|| metadata.and_then(|m| m.get("qobj_id")))
            .and_then(Value::as_str)
            .map(str::to_string);

        let name = self
            .circuit
            .as_ref()
            .map(|c| c.name().to_string())
            .or_else(|| {
                doc.and_then(|d| d.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });

        Ok(ExecutionResult {
            backend_name: self.backend_name.clone(),
            backend_version: self.backend_version.clone(),
            qobj_id,
            job_id,
            success: true,
            results: vec![ExperimentResult {
                name,
                shots,
                success: true,
                counts,
            }],
        })
    }
}

/// Map an IonQ job document to a status.
pub fn parse_status(doc: &Value) -> IonQResult<JobStatus> {
    let status = doc
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| IonQError::JobError("Job response has no status".into()))?;

    match status {
        "submitted" | "ready" => Ok(JobStatus::Queued),
        "running" => Ok(JobStatus::Running),
        "completed" => Ok(JobStatus::Completed),
        "canceled" | "cancelled" => Ok(JobStatus::Cancelled),
        "failed" => {
            let failure = doc.get("failure");
            let reason = failure
                .and_then(|f| f.get("error"))
                .or(failure)
                .and_then(Value::as_str)
                .unwrap_or("unknown failure");
            Ok(JobStatus::Failed(reason.to_string()))
        }
        other => Err(IonQError::JobError(format!("Unknown job status '{other}'"))),
    }
}

#[async_trait]
impl JobHandle for IonQJob {
    type Error = IonQError;

    fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    async fn submit(&mut self) -> IonQResult<()> {
        let Some(circuit) = &self.circuit else {
            return Err(IonQError::JobError(
                "Cannot submit a job without a circuit. \
                 Please create a job with a circuit and try again."
                    .into(),
            ));
        };
        if let Some(id) = &self.job_id {
            return Err(IonQError::JobError(format!("Job {id} has already been submitted.")));
        }

        let request = circuit_to_ionq(circuit, &self.target, self.shots)?;
        let response = self.api.submit_job(&request).await?;

        info!(
            "Submitted circuit '{}' to {} as job {}",
            circuit.name(),
            self.backend_name,
            response.id
        );
        self.job_id = Some(JobId::new(response.id));
        self.status = JobStatus::Queued;
        Ok(())
    }

    async fn status(&mut self) -> IonQResult<JobStatus> {
        let Some(id) = &self.job_id else {
            return Ok(self.status.clone());
        };
        if self.status.is_terminal() {
            return Ok(self.status.clone());
        }

        let doc = self.api.retrieve_job(&id.0).await?;
        let status = parse_status(&doc)?;
        debug!("IonQ job {} is {}", id, status);

        if status == JobStatus::Completed {
            self.result_doc = Some(doc);
        }
        self.status = status.clone();
        Ok(status)
    }

    async fn result(&mut self) -> IonQResult<ExecutionResult> {
        let job_id = self.require_id("fetch results of")?.clone();

        let status = match self
            .wait_for_final_state(self.timeout, self.poll_interval)
            .await
        {
            Ok(status) => status,
            Err(IonQError::Hal(HalError::Timeout(_))) => {
                return Err(IonQError::JobTimeout(
                    "Timed out waiting for job to complete.".into(),
                ));
            }
            Err(e) => return Err(e),
        };

        match status {
            JobStatus::Completed => self.build_result(job_id),
            JobStatus::Failed(reason) => Err(IonQError::JobFailed(reason)),
            JobStatus::Cancelled => Err(IonQError::JobCancelled),
            other => Err(IonQError::JobError(format!(
                "Job {job_id} ended in non-terminal state {other}"
            ))),
        }
    }

    async fn cancel(&mut self) -> IonQResult<()> {
        let id = self.require_id("cancel")?;
        self.api.cancel_job(&id.0).await?;
        info!("Cancellation requested for IonQ job {}", id);
        Ok(())
    }
}
