//! IonQ backend implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use arvak_hal::{Backend, Capabilities, HalResult, JobHandle, JobId, ValidationResult};
use arvak_ir::{Circuit, GateKind, InstructionKind};

use crate::api::{CalibrationLookup, IonQApi};
use crate::error::{IonQError, IonQResult};
use crate::job::IonQJob;

/// Name of the cloud simulator backend.
pub const SIMULATOR_NAME: &str = "ionq_simulator";
/// Name of the trapped-ion QPU backend.
pub const QPU_NAME: &str = "ionq_qpu";

/// Version reported for both backends.
pub const BACKEND_VERSION: &str = "0.0.1";
/// Shots used when the caller does not pick a number.
pub const DEFAULT_SHOTS: u32 = 1024;
/// Largest accepted shot count.
pub const MAX_SHOTS: u32 = 10_000;

const SIMULATOR_QUBITS: u32 = 29;
const QPU_QUBITS: u32 = 11;

/// An IonQ target (`simulator` or `qpu`).
///
/// Both variants share one API client. Capabilities are fixed at
/// construction.
#[derive(Clone)]
pub struct IonQBackend {
    api: Arc<dyn IonQApi>,
    target: &'static str,
    capabilities: Capabilities,
}

impl std::fmt::Debug for IonQBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IonQBackend")
            .field("name", &self.capabilities.name)
            .field("target", &self.target)
            .field("num_qubits", &self.capabilities.num_qubits)
            .finish()
    }
}

impl IonQBackend {
    /// The IonQ cloud simulator.
    pub fn simulator(api: Arc<dyn IonQApi>) -> Self {
        Self {
            api,
            target: "simulator",
            capabilities: Capabilities::ionq(SIMULATOR_NAME, SIMULATOR_QUBITS)
                .with_simulator(true)
                .with_max_shots(MAX_SHOTS),
        }
    }

    /// The IonQ trapped-ion QPU.
    pub fn qpu(api: Arc<dyn IonQApi>) -> Self {
        Self {
            api,
            target: "qpu",
            capabilities: Capabilities::ionq(QPU_NAME, QPU_QUBITS).with_max_shots(MAX_SHOTS),
        }
    }

    /// Target string sent in job submissions.
    pub fn target(&self) -> &str {
        self.target
    }

    pub fn default_shots(&self) -> u32 {
        DEFAULT_SHOTS
    }

    /// API client shared by this backend's jobs.
    pub fn api(&self) -> Arc<dyn IonQApi> {
        Arc::clone(&self.api)
    }

    /// Reject shot counts outside `1..=max_shots`.
    pub fn check_shots(&self, shots: u32) -> IonQResult<()> {
        let max = self.capabilities.max_shots;
        if shots == 0 || shots > max {
            return Err(IonQError::InvalidShots(format!(
                "{shots} (must be between 1 and {max})"
            )));
        }
        Ok(())
    }

    /// Unsubmitted job for `circuit`.
    pub fn job(&self, circuit: Circuit, shots: u32) -> IonQJob {
        IonQJob::from_circuit(self, circuit, shots)
    }

    /// Submit with [`DEFAULT_SHOTS`].
    pub async fn run_default(&self, circuit: Circuit) -> IonQResult<IonQJob> {
        self.run(circuit, DEFAULT_SHOTS).await
    }

    /// Handle on an existing job, with its status fetched once.
    #[instrument(skip(self))]
    pub async fn retrieve_job(&self, job_id: &str) -> IonQResult<IonQJob> {
        let mut job = IonQJob::from_id(self, JobId::new(job_id));
        job.status().await?;
        Ok(job)
    }

    /// [`retrieve_job`](Self::retrieve_job) for each id, in order.
    pub async fn retrieve_jobs<S: AsRef<str>>(&self, job_ids: &[S]) -> IonQResult<Vec<IonQJob>> {
        let mut jobs = Vec::with_capacity(job_ids.len());
        for id in job_ids {
            jobs.push(self.retrieve_job(id.as_ref()).await?);
        }
        Ok(jobs)
    }

    /// Latest characterization of this backend.
    pub async fn calibration(&self) -> IonQResult<CalibrationLookup> {
        self.api.get_calibration_data(self.name()).await
    }

    fn validation_reasons(&self, circuit: &Circuit) -> Vec<String> {
        let caps = &self.capabilities;
        let mut reasons = Vec::new();

        if circuit.num_qubits() > caps.num_qubits as usize {
            reasons.push(format!(
                "Circuit has {} qubits but {} supports at most {}",
                circuit.num_qubits(),
                caps.name,
                caps.num_qubits
            ));
        }

        let mut native = false;
        let mut non_native = false;
        for inst in circuit.instructions() {
            let gate = match &inst.kind {
                InstructionKind::Gate(gate) => gate,
                InstructionKind::Reset => {
                    reasons.push("Mid-circuit reset is not supported".into());
                    continue;
                }
                InstructionKind::Measure | InstructionKind::Barrier => continue,
            };

            let GateKind::Standard(standard) = &gate.kind else {
                reasons.push(format!("Unsupported gate '{}'", gate.name()));
                continue;
            };
            if !caps.gate_set.contains(standard.name()) {
                reasons.push(format!("Unsupported gate '{}'", standard.name()));
            }
            if standard.parameters().iter().any(|p| p.is_symbolic()) {
                reasons.push(format!("Gate '{}' has an unbound parameter", standard.name()));
            }
            if standard.name() != "id" {
                if standard.is_ionq_native() {
                    native = true;
                } else {
                    non_native = true;
                }
            }
        }

        if native && non_native {
            reasons.push("Native gates (gpi, gpi2, ms) cannot be mixed with other gates".into());
        }
        reasons
    }
}

#[async_trait]
impl Backend for IonQBackend {
    type Job = IonQJob;

    fn name(&self) -> &str {
        &self.capabilities.name
    }

    fn version(&self) -> &str {
        BACKEND_VERSION
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        let reasons = self.validation_reasons(circuit);
        if reasons.is_empty() {
            Ok(ValidationResult::Valid)
        } else {
            debug!("Circuit '{}' rejected by {}: {:?}", circuit.name(), self.name(), reasons);
            Ok(ValidationResult::Invalid { reasons })
        }
    }

    async fn run(&self, circuit: Circuit, shots: u32) -> IonQResult<IonQJob> {
        self.check_shots(shots)?;
        if circuit.num_qubits() > self.capabilities.num_qubits as usize {
            return Err(IonQError::CircuitTooLarge(format!(
                "{} qubits requested, {} has {}",
                circuit.num_qubits(),
                self.name(),
                self.capabilities.num_qubits
            )));
        }

        let mut job = self.job(circuit, shots);
        job.submit().await?;
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use arvak_hal::JobStatus;
    use arvak_ir::{Gate, ParameterExpression, QubitId};
    use serde_json::{Value, json};

    use super::*;
    use crate::api::{Calibration, SubmitResponse};
    use crate::serialize::SubmitRequest;

    #[derive(Default)]
    struct RecordingApi {
        submitted: Mutex<Vec<SubmitRequest>>,
        retrieved: Mutex<Vec<String>>,
        calibration_for: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl IonQApi for RecordingApi {
        async fn submit_job(&self, request: &SubmitRequest) -> IonQResult<SubmitResponse> {
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(request.clone());
            Ok(SubmitResponse {
                id: format!("job-{}", submitted.len()),
                status: Some("ready".into()),
            })
        }

        async fn retrieve_job(&self, job_id: &str) -> IonQResult<Value> {
            self.retrieved.lock().unwrap().push(job_id.to_string());
            Ok(json!({"id": job_id, "status": "running"}))
        }

        async fn cancel_job(&self, _job_id: &str) -> IonQResult<Value> {
            Ok(json!({}))
        }

        async fn delete_job(&self, _job_id: &str) -> IonQResult<Value> {
            Ok(json!({}))
        }

        async fn get_calibration_data(&self, backend_name: &str) -> IonQResult<CalibrationLookup> {
            self.calibration_for.lock().unwrap().push(backend_name.to_string());
            Ok(CalibrationLookup::Found(Calibration {
                qubits: Some(11),
                ..Calibration::default()
            }))
        }
    }

    fn backends() -> (Arc<RecordingApi>, IonQBackend, IonQBackend) {
        let api = Arc::new(RecordingApi::default());
        let sim = IonQBackend::simulator(api.clone());
        let qpu = IonQBackend::qpu(api.clone());
        (api, sim, qpu)
    }

    #[test]
    fn test_backend_identity() {
        let (_, sim, qpu) = backends();
        assert_eq!(sim.name(), "ionq_simulator");
        assert_eq!(sim.target(), "simulator");
        assert_eq!(sim.capabilities().num_qubits, 29);
        assert!(sim.capabilities().is_simulator);

        assert_eq!(qpu.name(), "ionq_qpu");
        assert_eq!(qpu.target(), "qpu");
        assert_eq!(qpu.capabilities().num_qubits, 11);
        assert!(!qpu.capabilities().is_simulator);
        assert_eq!(qpu.version(), "0.0.1");
        assert_eq!(qpu.capabilities().max_shots, 10_000);
    }

    #[tokio::test]
    async fn test_validate() {
        let (_, _, qpu) = backends();

        let bell = Circuit::bell().unwrap();
        assert!(qpu.validate(&bell).await.unwrap().is_valid());

        let wide = Circuit::with_size("wide", 12, 0);
        assert!(!qpu.validate(&wide).await.unwrap().is_valid());

        let mut custom = Circuit::with_size("custom", 1, 0);
        custom.append(Gate::custom("oracle", 1), [QubitId(0)]).unwrap();
        custom.rz(ParameterExpression::symbol("theta"), QubitId(0)).unwrap();
        custom.gpi(0.1, QubitId(0)).unwrap();
        match qpu.validate(&custom).await.unwrap() {
            ValidationResult::Invalid { reasons } => {
                assert_eq!(reasons.len(), 3, "{reasons:?}");
                assert!(reasons[0].contains("oracle"));
                assert!(reasons[1].contains("unbound"));
                assert!(reasons[2].contains("mixed"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_submits_to_target() {
        let (api, sim, _) = backends();

        let job = sim.run(Circuit::bell().unwrap(), 500).await.unwrap();
        assert_eq!(job.job_id(), Some(&JobId::new("job-1")));
        assert_eq!(job.cached_status(), &JobStatus::Queued);

        let submitted = api.submitted.lock().unwrap();
        assert_eq!(submitted[0].target, "simulator");
        assert_eq!(submitted[0].shots, 500);
    }

    #[tokio::test]
    async fn test_run_default_shots() {
        let (api, sim, _) = backends();
        sim.run_default(Circuit::bell().unwrap()).await.unwrap();
        assert_eq!(api.submitted.lock().unwrap()[0].shots, DEFAULT_SHOTS);
    }

    #[tokio::test]
    async fn test_run_rejects_bad_shots_and_size() {
        let (api, _, qpu) = backends();

        for shots in [0, MAX_SHOTS + 1] {
            let err = qpu.run(Circuit::bell().unwrap(), shots).await.unwrap_err();
            assert!(matches!(err, IonQError::InvalidShots(_)));
        }

        let err = qpu
            .run(Circuit::with_size("wide", 12, 0), 100)
            .await
            .unwrap_err();
        assert!(matches!(err, IonQError::CircuitTooLarge(_)));
        assert!(api.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_jobs_fetches_status() {
        let (api, _, qpu) = backends();

        let jobs = qpu.retrieve_jobs(&["a", "b"]).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].job_id(), Some(&JobId::new("b")));
        assert_eq!(jobs[0].cached_status(), &JobStatus::Running);
        assert_eq!(*api.retrieved.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_calibration_uses_backend_name() {
        let (api, _, qpu) = backends();
        let calibration = qpu.calibration().await.unwrap().into_option().unwrap();
        assert_eq!(calibration.qubits, Some(11));
        assert_eq!(*api.calibration_for.lock().unwrap(), vec!["ionq_qpu"]);
    }
}
