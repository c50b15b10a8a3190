//! Error types for the IonQ adapter.

use arvak_hal::HalError;
use thiserror::Error;

/// Result type for IonQ operations.
pub type IonQResult<T> = Result<T, IonQError>;

/// Errors that can occur when interacting with IonQ.
#[derive(Debug, Error)]
pub enum IonQError {
    /// API returned a non-success response.
    #[error("IonQ API error ({status}, {error_type}): {message}")]
    Api {
        status: u16,
        error_type: String,
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No API token was supplied or found in the environment.
    #[error("Missing IonQ API token: pass one explicitly or set IONQ_API_TOKEN")]
    MissingToken,

    /// Invalid job operation or malformed job data.
    #[error("{0}")]
    JobError(String),

    /// Gave up waiting for a job to reach a final state.
    #[error("{0}")]
    JobTimeout(String),

    /// Job finished in the failed state.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job finished in the cancelled state.
    #[error("Job was cancelled")]
    JobCancelled,

    /// Circuit contains a gate IonQ cannot run.
    #[error("Unsupported gate: {0}")]
    UnsupportedGate(String),

    /// Circuit contains an unbound symbolic parameter.
    #[error("Symbolic (unbound) parameter in gate: {0}")]
    SymbolicParameter(String),

    /// Circuit exceeds the backend's qubit count.
    #[error("Circuit too large: {0}")]
    CircuitTooLarge(String),

    /// Shot count outside the accepted range.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// No backend with this name.
    #[error("Backend not found: {0}")]
    BackendNotFound(String),

    /// Error raised by the host layer.
    #[error(transparent)]
    Hal(#[from] HalError),
}

impl IonQError {
    /// Whether the failed call may succeed if issued again.
    pub fn is_retriable(&self) -> bool {
        match self {
            IonQError::Http(e) => e.is_timeout() || e.is_connect(),
            IonQError::Api { status, .. } => {
                matches!(status, 408 | 425 | 429 | 500 | 502 | 503 | 504)
            }
            IonQError::Hal(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<IonQError> for HalError {
    fn from(e: IonQError) -> Self {
        match e {
            IonQError::MissingToken => HalError::AuthenticationFailed(e.to_string()),
            IonQError::Api {
                status: 401 | 403, ..
            } => HalError::AuthenticationFailed(e.to_string()),
            IonQError::Api { status: 404, .. } => HalError::JobNotFound(e.to_string()),
            IonQError::Http(err) => HalError::Network(err),
            IonQError::Json(err) => HalError::Serialization(err),
            IonQError::JobTimeout(msg) => HalError::Timeout(msg),
            IonQError::JobFailed(msg) => HalError::JobFailed(msg),
            IonQError::JobCancelled => HalError::JobCancelled,
            IonQError::UnsupportedGate(_) | IonQError::SymbolicParameter(_) => {
                HalError::InvalidCircuit(e.to_string())
            }
            IonQError::CircuitTooLarge(msg) => HalError::CircuitTooLarge(msg),
            IonQError::InvalidShots(msg) => HalError::InvalidShots(msg),
            IonQError::BackendNotFound(name) => HalError::BackendUnavailable(name),
            IonQError::Hal(inner) => inner,
            _ => HalError::Backend(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> IonQError {
        IonQError::Api {
            status,
            error_type: "internal_error".into(),
            message: "boom".into(),
        }
    }

    #[test]
    fn test_missing_token_display() {
        assert!(IonQError::MissingToken.to_string().contains("IONQ_API_TOKEN"));
    }

    #[test]
    fn test_api_error_display() {
        let msg = api(503).to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("internal_error"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_job_error_display_is_bare_message() {
        let err = IonQError::JobError("Cannot remap counts without qubits!".into());
        assert_eq!(err.to_string(), "Cannot remap counts without qubits!");
    }

    #[test]
    fn test_retriable_statuses() {
        for status in [408, 425, 429, 500, 502, 503, 504] {
            assert!(api(status).is_retriable(), "{status} should be retriable");
        }
        for status in [400, 401, 403, 404, 409, 501] {
            assert!(!api(status).is_retriable(), "{status} should not be retriable");
        }
    }

    #[test]
    fn test_non_transport_errors_are_not_retriable() {
        assert!(!IonQError::MissingToken.is_retriable());
        assert!(!IonQError::JobError("x".into()).is_retriable());
        assert!(!IonQError::JobCancelled.is_retriable());
        assert!(IonQError::Hal(HalError::BackendUnavailable("down".into())).is_retriable());
    }

    // -- HalError conversion tests --

    #[test]
    fn test_missing_token_to_hal() {
        let hal: HalError = IonQError::MissingToken.into();
        assert!(matches!(hal, HalError::AuthenticationFailed(_)));
    }

    #[test]
    fn test_unauthorized_to_hal() {
        let hal: HalError = api(401).into();
        assert!(matches!(hal, HalError::AuthenticationFailed(_)));
    }

    #[test]
    fn test_job_outcomes_to_hal() {
        let hal: HalError = IonQError::JobFailed("err".into()).into();
        assert!(matches!(hal, HalError::JobFailed(msg) if msg == "err"));

        let hal: HalError = IonQError::JobCancelled.into();
        assert!(matches!(hal, HalError::JobCancelled));

        let hal: HalError = IonQError::JobTimeout("slow".into()).into();
        assert!(matches!(hal, HalError::Timeout(msg) if msg == "slow"));
    }

    #[test]
    fn test_circuit_errors_to_hal() {
        let hal: HalError = IonQError::UnsupportedGate("reset".into()).into();
        assert!(matches!(hal, HalError::InvalidCircuit(_)));

        let hal: HalError = IonQError::CircuitTooLarge("30 > 29".into()).into();
        assert!(matches!(hal, HalError::CircuitTooLarge(_)));
    }

    #[test]
    fn test_hal_round_trip_keeps_variant() {
        let err: IonQError = HalError::Timeout("job-7".into()).into();
        let hal: HalError = err.into();
        assert!(matches!(hal, HalError::Timeout(id) if id == "job-7"));
    }

    #[test]
    fn test_server_error_to_hal() {
        let hal: HalError = api(500).into();
        assert!(matches!(hal, HalError::Backend(_)));
    }
}
