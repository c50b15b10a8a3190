//! Arvak Hardware Abstraction Layer
//!
//! The plugin surface that vendor adapters implement and that user code
//! programs against.
//!
//! # Overview
//!
//! - A [`Backend`] trait: identity, cached [`Capabilities`], circuit
//!   validation, and `run()` which hands back a job.
//! - A [`JobHandle`] trait for the job lifecycle, with a provided
//!   [`JobHandle::wait_for_final_state`] poll loop.
//! - [`JobStatus`], the shared status enumeration.
//! - Unified results via [`ExecutionResult`], [`ExperimentResult`] and
//!   [`Counts`].
//! - A [`BackendRegistry`] for listing, filtering and looking up backends by
//!   name.
//!
//! # Example: Running a Circuit
//!
//! ```ignore
//! use arvak_hal::{Backend, JobHandle};
//! use arvak_adapter_ionq::IonQProvider;
//! use arvak_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = IonQProvider::new(None, None)?;
//!     let backend = provider.get_backend("ionq_simulator")?;
//!
//!     let mut job = backend.run(Circuit::bell()?, 1000).await?;
//!     let result = job.result().await?;
//!
//!     if let Some((bitstring, count)) = result.counts().and_then(|c| c.most_frequent()) {
//!         println!("Most frequent: {} ({} times)", bitstring, count);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod capability;
pub mod error;
pub mod job;
pub mod registry;
pub mod result;

pub use backend::{Backend, BackendConfig, ValidationResult};
pub use capability::{Capabilities, GateSet};
pub use error::{HalError, HalResult};
pub use job::{JobHandle, JobId, JobStatus};
pub use registry::BackendRegistry;
pub use result::{Counts, ExecutionResult, ExperimentResult};
