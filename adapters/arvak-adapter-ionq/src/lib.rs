//! Arvak Adapter for IonQ Trapped-Ion Quantum Computers
//!
//! This crate provides backend implementations for IonQ's cloud simulator
//! and QPU via the IonQ REST API (`https://api.ionq.co/v0.1`).
//!
//! # Backends
//!
//! | Name             | Target      | Qubits | Notes                          |
//! |------------------|-------------|--------|--------------------------------|
//! | `ionq_simulator` | `simulator` | 29     | Ideal cloud simulator          |
//! | `ionq_qpu`       | `qpu`       | 11     | Trapped-ion hardware, all-to-all connectivity |
//!
//! # Authentication
//!
//! Pass a token to [`IonQProvider::new`] or set the `IONQ_API_TOKEN`
//! environment variable:
//!
//! ```bash
//! export IONQ_API_TOKEN="your-api-key"
//! ```
//!
//! `IONQ_API_URL` overrides the endpoint.
//!
//! # Gate Set
//!
//! Circuits use either the standard gates (compiled by IonQ) or IonQ's
//! native gates `gpi`, `gpi2` and `ms`, never both. See [`serialize`] for
//! the mapping.
//!
//! # Example
//!
//! ```ignore
//! use arvak_adapter_ionq::IonQProvider;
//! use arvak_hal::{Backend, JobHandle};
//! use arvak_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = IonQProvider::new(None, None)?;
//!     let backend = provider.get_backend("ionq_simulator")?;
//!
//!     let mut job = backend.run(Circuit::bell()?, 1000).await?;
//!     println!("Job: {:?}", job.job_id());
//!
//!     let result = job.result().await?;
//!     println!("Counts: {:?}", result.counts());
//!     Ok(())
//! }
//! ```

pub mod api;
mod backend;
pub mod credentials;
mod error;
mod job;
mod provider;
pub mod remap;
pub mod retry;
pub mod serialize;

pub use api::{
    Calibration, CalibrationLookup, ClientOptions, IonQApi, IonQClient, RetryPolicies,
    SubmitResponse,
};
pub use backend::{
    BACKEND_VERSION, DEFAULT_SHOTS, IonQBackend, MAX_SHOTS, QPU_NAME, SIMULATOR_NAME,
};
pub use credentials::{IonQCredentials, resolve_credentials};
pub use error::{IonQError, IonQResult};
pub use job::{DEFAULT_POLL_INTERVAL, IonQJob, parse_status};
pub use provider::IonQProvider;
pub use remap::remap_counts;
pub use retry::RetryPolicy;
pub use serialize::{SubmitRequest, circuit_to_ionq};

// Re-export common types for convenience.
pub use arvak_hal::{Backend, BackendConfig, JobHandle, JobStatus};
