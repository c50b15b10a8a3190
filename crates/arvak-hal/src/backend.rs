//! Backend trait and configuration.
//!
//! The [`Backend`] trait covers the part of the lifecycle that does not
//! belong to a particular job:
//!
//! ```text
//!   capabilities() ──→ validate() ──→ run() ──→ Job: status() / result()
//!    (sync, &ref)       (async)      (async)        (see JobHandle)
//! ```
//!
//! ## Method table
//!
//! | Method | Kind | Returns |
//! |--------|------|---------|
//! | `name()` | sync | `&str` |
//! | `version()` | sync | `&str` |
//! | `capabilities()` | sync | `&Capabilities` |
//! | `validate()` | async | `HalResult<ValidationResult>` |
//! | `run()` | async | submitted `Self::Job` |

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use arvak_ir::Circuit;

use crate::capability::Capabilities;
use crate::error::HalResult;
use crate::job::JobHandle;

/// Configuration for a backend instance.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name of the backend.
    pub name: String,
    /// API endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Authentication token.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Additional configuration.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BackendConfig {
    /// Create a new backend configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            token: None,
            extra: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("extra", &self.extra)
            .finish()
    }
}

/// Trait for quantum backends.
///
/// - `capabilities()` is synchronous and infallible; implementations cache
///   capabilities at construction time.
/// - `validate()` checks a circuit against those capabilities without I/O.
/// - `run()` creates a job for the circuit, submits it, and returns the
///   handle. The handle's status is `Queued` on return.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Job handle produced by [`run`](Self::run).
    type Job: JobHandle + 'static;

    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Backend version string.
    fn version(&self) -> &str;

    /// Get the capabilities of this backend.
    fn capabilities(&self) -> &Capabilities;

    /// Validate a circuit against backend constraints.
    ///
    /// Returns a three-state result so that callers can decide between
    /// compiling and retrying or routing elsewhere.
    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult>;

    /// Submit a circuit for execution.
    async fn run(
        &self,
        circuit: Circuit,
        shots: u32,
    ) -> Result<Self::Job, <Self::Job as JobHandle>::Error>;
}

/// Result of circuit validation against backend constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Circuit is valid and can be submitted directly.
    Valid,
    /// Circuit is invalid for this backend.
    Invalid {
        /// Reasons the circuit is invalid.
        reasons: Vec<String>,
    },
    /// Circuit could run after transpilation.
    RequiresTranspilation {
        /// What transpilation is needed.
        details: String,
    },
}

impl ValidationResult {
    /// Check if the circuit is valid (can be submitted as-is).
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config() {
        let config = BackendConfig::new("ionq_qpu")
            .with_endpoint("https://api.ionq.co/v0.1")
            .with_token("secret-token")
            .with_extra("timeout_secs", serde_json::json!(30));

        assert_eq!(config.name, "ionq_qpu");
        assert_eq!(config.endpoint.as_deref(), Some("https://api.ionq.co/v0.1"));
        assert_eq!(config.token.as_deref(), Some("secret-token"));
        assert!(config.extra.contains_key("timeout_secs"));
    }

    #[test]
    fn test_backend_config_hides_token() {
        let config = BackendConfig::new("ionq_qpu").with_token("secret-token");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-token"));
    }

    #[test]
    fn test_validation_result_is_valid() {
        assert!(ValidationResult::Valid.is_valid());
        assert!(!ValidationResult::Invalid { reasons: vec![] }.is_valid());
        assert!(
            !ValidationResult::RequiresTranspilation {
                details: String::new()
            }
            .is_valid()
        );
    }
}
