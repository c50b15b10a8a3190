//! Entry point: credentials, one shared client, and the backend registry.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use arvak_hal::{Backend, BackendConfig, BackendRegistry, HalError};

use crate::api::{ClientOptions, IonQApi, IonQClient};
use crate::backend::IonQBackend;
use crate::credentials::{IonQCredentials, resolve_credentials};
use crate::error::{IonQError, IonQResult};

/// Access to IonQ's simulator and QPU.
pub struct IonQProvider {
    simulator: IonQBackend,
    qpu: IonQBackend,
    registry: BackendRegistry<IonQBackend>,
}

impl std::fmt::Debug for IonQProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IonQProvider")
            .field("backends", &self.registry.available_backends())
            .finish()
    }
}

impl IonQProvider {
    /// Resolve credentials (argument, then `IONQ_API_TOKEN`/`IONQ_API_URL`,
    /// then the public endpoint) and connect with default options.
    pub fn new(token: Option<String>, url: Option<String>) -> IonQResult<Self> {
        Self::with_options(resolve_credentials(token, url), ClientOptions::default())
    }

    /// Connect with resolved credentials and explicit client options.
    pub fn with_options(credentials: IonQCredentials, options: ClientOptions) -> IonQResult<Self> {
        info!("Connecting to IonQ at {}", credentials.url);
        let client = IonQClient::with_options(credentials, options)?;
        Ok(Self::with_api(Arc::new(client)))
    }

    /// Build from host configuration.
    ///
    /// Reads `endpoint` and `token`, plus the extras `timeout_secs` (integer)
    /// and `headers` (object of strings). Missing values fall back to the
    /// environment and defaults as in [`new`](Self::new).
    pub fn from_config(config: &BackendConfig) -> IonQResult<Self> {
        let credentials = resolve_credentials(config.token.clone(), config.endpoint.clone());
        let mut options = ClientOptions::default();

        if let Some(timeout) = config.extra.get("timeout_secs") {
            let secs = timeout.as_u64().ok_or_else(|| {
                HalError::Configuration(format!("timeout_secs must be an integer, got {timeout}"))
            })?;
            options = options.with_timeout(Duration::from_secs(secs));
        }

        match config.extra.get("headers") {
            None | Some(Value::Null) => {}
            Some(Value::Object(headers)) => {
                for (name, value) in headers {
                    let value = value.as_str().ok_or_else(|| {
                        HalError::Configuration(format!("header '{name}' must be a string"))
                    })?;
                    options = options.with_header(name.clone(), value);
                }
            }
            Some(other) => {
                return Err(HalError::Configuration(format!(
                    "headers must be an object, got {other}"
                ))
                .into());
            }
        }

        Self::with_options(credentials, options)
    }

    /// Build on any API implementation.
    pub fn with_api(api: Arc<dyn IonQApi>) -> Self {
        let simulator = IonQBackend::simulator(Arc::clone(&api));
        let qpu = IonQBackend::qpu(api);
        let registry = BackendRegistry::from_backends([simulator.clone(), qpu.clone()]);
        Self {
            simulator,
            qpu,
            registry,
        }
    }

    /// All backends, simulator first.
    pub fn backends(&self) -> &[IonQBackend] {
        self.registry.backends()
    }

    /// Backends matching an optional exact name and an optional predicate.
    pub fn backends_filtered(
        &self,
        name: Option<&str>,
        predicate: Option<&dyn Fn(&IonQBackend) -> bool>,
    ) -> Vec<&IonQBackend> {
        self.registry.filter(name, predicate)
    }

    /// Backend by name.
    pub fn get_backend(&self, name: &str) -> IonQResult<&IonQBackend> {
        self.registry
            .get(name)
            .ok_or_else(|| IonQError::BackendNotFound(name.to_string()))
    }

    /// The `ionq_simulator` backend.
    pub fn simulator(&self) -> &IonQBackend {
        &self.simulator
    }

    /// The `ionq_qpu` backend.
    pub fn qpu(&self) -> &IonQBackend {
        &self.qpu
    }

    pub fn registry(&self) -> &BackendRegistry<IonQBackend> {
        &self.registry
    }
}
