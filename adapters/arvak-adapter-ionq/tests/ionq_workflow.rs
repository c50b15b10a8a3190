//! End-to-end job workflow against an in-memory IonQ API.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use arvak_adapter_ionq::{
    Backend, CalibrationLookup, IonQApi, IonQError, IonQProvider, IonQResult, JobHandle,
    JobStatus, SubmitRequest, SubmitResponse,
};
use arvak_ir::Circuit;

/// Simulates IonQ: each job is `ready`, then `running`, then `completed`
/// with an even split over the measured outcomes.
#[derive(Default)]
struct InMemoryIonQ {
    jobs: Mutex<Vec<(String, SubmitRequest, usize)>>,
    cancelled: Mutex<Vec<String>>,
}

impl InMemoryIonQ {
    fn document(id: &str, request: &SubmitRequest, polls: usize) -> Value {
        let status = match polls {
            0 => "ready",
            1 => "running",
            _ => "completed",
        };
        let mut doc = json!({
            "id": id,
            "status": status,
            "qubits": request.body.qubits,
            "metadata": serde_json::to_value(&request.metadata).unwrap_or(Value::Null),
        });
        if status == "completed" {
            // Bell state: |00> and |11>.
            doc["data"] = json!({"histogram": {"0": 0.5, "3": 0.5}});
        }
        doc
    }
}

#[async_trait]
impl IonQApi for InMemoryIonQ {
    async fn submit_job(&self, request: &SubmitRequest) -> IonQResult<SubmitResponse> {
        let mut jobs = self.jobs.lock().unwrap();
        let id = format!("job-{}", jobs.len() + 1);
        jobs.push((id.clone(), request.clone(), 0));
        Ok(SubmitResponse {
            id,
            status: Some("ready".into()),
        })
    }

    async fn retrieve_job(&self, job_id: &str) -> IonQResult<Value> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some((id, request, polls)) = jobs.iter_mut().find(|(id, _, _)| id == job_id) else {
            return Err(IonQError::Api {
                status: 404,
                error_type: "not_found".into(),
                message: format!("no job {job_id}"),
            });
        };
        let doc = Self::document(id, request, *polls);
        *polls += 1;
        Ok(doc)
    }

    async fn cancel_job(&self, job_id: &str) -> IonQResult<Value> {
        self.cancelled.lock().unwrap().push(job_id.to_string());
        Ok(json!({"id": job_id, "status": "canceled"}))
    }

    async fn delete_job(&self, job_id: &str) -> IonQResult<Value> {
        self.jobs.lock().unwrap().retain(|(id, _, _)| id != job_id);
        Ok(json!({"id": job_id, "status": "deleted"}))
    }

    async fn get_calibration_data(&self, _backend_name: &str) -> IonQResult<CalibrationLookup> {
        Ok(CalibrationLookup::NoCharacterization)
    }
}

#[tokio::test(start_paused = true)]
async fn test_bell_circuit_round_trip() {
    let api = Arc::new(InMemoryIonQ::default());
    let provider = IonQProvider::with_api(api.clone());
    let backend = provider.get_backend("ionq_simulator").unwrap();

    let circuit = Circuit::bell().unwrap();
    assert!(backend.validate(&circuit).await.unwrap().is_valid());

    let job = backend.run(circuit, 1000).await.unwrap();
    let mut job = job.with_poll_interval(Duration::from_millis(100));
    assert_eq!(job.cached_status(), &JobStatus::Queued);

    let result = job.result().await.unwrap();
    assert_eq!(result.backend_name, "ionq_simulator");
    assert_eq!(result.job_id.0, "job-1");

    let counts = result.counts().unwrap();
    assert_eq!(counts.get("00"), 500);
    assert_eq!(counts.get("11"), 500);
    assert_eq!(counts.total_shots(), 1000);
    assert_eq!(result.results[0].shots, 1000);
    assert_eq!(result.results[0].name.as_deref(), Some("bell"));

    // Terminal status is cached: no further polling.
    assert_eq!(job.status().await.unwrap(), JobStatus::Completed);
}

#[tokio::test]
async fn test_retrieve_cancel_and_delete() {
    let api = Arc::new(InMemoryIonQ::default());
    let provider = IonQProvider::with_api(api.clone());
    let qpu = provider.qpu();

    let submitted = qpu.run(Circuit::bell().unwrap(), 100).await.unwrap();
    let id = submitted.job_id().unwrap().0.clone();

    let mut job = qpu.retrieve_job(&id).await.unwrap();
    assert_eq!(job.cached_status(), &JobStatus::Queued);

    job.cancel().await.unwrap();
    assert_eq!(*api.cancelled.lock().unwrap(), vec![id.clone()]);

    job.delete().await.unwrap();
    let err = qpu.retrieve_job(&id).await.unwrap_err();
    assert!(matches!(err, IonQError::Api { status: 404, .. }));
}

#[tokio::test]
async fn test_calibration_soft_failure_is_not_an_error() {
    let provider = IonQProvider::with_api(Arc::new(InMemoryIonQ::default()));
    let lookup = provider.qpu().calibration().await.unwrap();
    assert_eq!(lookup, CalibrationLookup::NoCharacterization);
    assert!(lookup.into_option().is_none());
}

#[tokio::test]
async fn test_native_circuit_is_flagged_native() {
    let api = Arc::new(InMemoryIonQ::default());
    let provider = IonQProvider::with_api(api.clone());

    let mut circuit = Circuit::with_size("native", 2, 2);
    circuit.gpi2(0.0, arvak_ir::QubitId(0)).unwrap();
    circuit
        .ms(0.0, 0.0, arvak_ir::QubitId(0), arvak_ir::QubitId(1))
        .unwrap();
    circuit.measure_all().unwrap();

    provider.qpu().run(circuit, 100).await.unwrap();
    let jobs = api.jobs.lock().unwrap();
    assert_eq!(jobs[0].1.body.gateset.as_deref(), Some("native"));
    assert_eq!(jobs[0].1.target, "qpu");
}
