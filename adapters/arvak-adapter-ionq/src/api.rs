//! IonQ REST API client.
//!
//! Implements the IonQ v0.1 API (`https://api.ionq.co/v0.1`) for submitting
//! circuits, polling jobs, and reading backend calibration data.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use arvak_hal::HalError;

use crate::credentials::IonQCredentials;
use crate::error::{IonQError, IonQResult};
use crate::retry::RetryPolicy;
use crate::serialize::SubmitRequest;

/// Value sent in the `User-Agent` header.
pub fn user_agent() -> String {
    format!("arvak-adapter-ionq/{} (rust)", env!("CARGO_PKG_VERSION"))
}

/// Operations the job and backend layers need from IonQ.
///
/// [`IonQClient`] talks HTTP; tests substitute in-memory implementations.
#[async_trait]
pub trait IonQApi: Send + Sync {
    /// `POST jobs`.
    async fn submit_job(&self, request: &SubmitRequest) -> IonQResult<SubmitResponse>;

    /// `GET jobs/{id}`. Carries results once the job has completed.
    async fn retrieve_job(&self, job_id: &str) -> IonQResult<Value>;

    /// `PUT jobs/{id}/status/cancel`. A no-op for completed jobs.
    async fn cancel_job(&self, job_id: &str) -> IonQResult<Value>;

    /// `DELETE jobs/{id}`.
    async fn delete_job(&self, job_id: &str) -> IonQResult<Value>;

    /// Calibration data for the backend whose name ends with an IonQ
    /// backend identifier.
    async fn get_calibration_data(&self, backend_name: &str) -> IonQResult<CalibrationLookup>;
}

/// Response to a job submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned job id.
    pub id: String,
    /// Initial status, normally `"ready"` or `"submitted"`.
    #[serde(default)]
    pub status: Option<String>,
}

/// One entry of the `GET backends` listing.
#[derive(Debug, Clone, Deserialize)]
struct BackendEntry {
    #[serde(default)]
    backend: Option<String>,
    #[serde(default)]
    characterization_url: Option<String>,
}

/// Summary statistic in a calibration's fidelity table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FidelityStat {
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub stderr: Option<f64>,
}

/// Backend characterization as published by IonQ.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    #[serde(default)]
    pub id: Option<String>,
    /// Unix timestamp (seconds) of the measurement.
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub qubits: Option<u32>,
    #[serde(default)]
    pub connectivity: Vec<Value>,
    /// Keyed by metric, e.g. `"spam"`, `"1q"`, `"2q"`.
    #[serde(default)]
    pub fidelity: FxHashMap<String, FidelityStat>,
    /// Durations keyed by operation, e.g. `"readout"`, `"reset"`.
    #[serde(default)]
    pub timing: FxHashMap<String, f64>,
}

impl Calibration {
    /// Measurement time of this calibration.
    pub fn measured_at(&self) -> Option<DateTime<Utc>> {
        self.date.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Outcome of a calibration lookup.
///
/// Only `Found` carries data; the others are logged at `warn` level when
/// they occur and are not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationLookup {
    Found(Calibration),
    /// No IonQ backend identifier is a suffix of the requested name.
    NotFound,
    /// More than one backend matched; their identifiers.
    Ambiguous(Vec<String>),
    /// The matching backend publishes no characterization.
    NoCharacterization,
}

impl CalibrationLookup {
    /// The calibration, if one was found.
    pub fn into_option(self) -> Option<Calibration> {
        match self {
            CalibrationLookup::Found(calibration) => Some(calibration),
            _ => None,
        }
    }
}

/// Retry policy per API operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicies {
    pub submit: RetryPolicy,
    pub retrieve: RetryPolicy,
    pub cancel: RetryPolicy,
    pub delete: RetryPolicy,
    pub calibration: RetryPolicy,
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            submit: RetryPolicy::attempts(5),
            retrieve: RetryPolicy::long_poll(),
            cancel: RetryPolicy::attempts(5),
            delete: RetryPolicy::attempts(3),
            calibration: RetryPolicy::long_poll(),
        }
    }
}

/// Transport settings for [`IonQClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Extra headers, sent before the standard ones (which win on conflict).
    pub custom_headers: Vec<(String, String)>,
    pub retries: RetryPolicies,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            custom_headers: Vec::new(),
            retries: RetryPolicies::default(),
        }
    }
}

impl ClientOptions {
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_retries(mut self, retries: RetryPolicies) -> Self {
        self.retries = retries;
        self
    }
}

/// IonQ REST API client.
///
/// Authenticates with `Authorization: apiKey <token>`. A client without a
/// token can be built, but every call then fails with
/// [`IonQError::MissingToken`] before touching the network.
pub struct IonQClient {
    /// HTTP client with timeouts configured.
    client: Client,
    /// API base URL (without trailing slash).
    base_url: String,
    token: Option<String>,
    custom_headers: Vec<(String, String)>,
    retries: RetryPolicies,
}

impl fmt::Debug for IonQClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IonQClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("custom_headers", &self.custom_headers.len())
            .finish()
    }
}

impl IonQClient {
    /// Create a client from resolved credentials with default options.
    pub fn new(credentials: IonQCredentials) -> IonQResult<Self> {
        Self::with_options(credentials, ClientOptions::default())
    }

    /// Create a client with explicit transport options.
    pub fn with_options(credentials: IonQCredentials, options: ClientOptions) -> IonQResult<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(IonQError::Http)?;

        Ok(Self {
            client,
            base_url: credentials.url.trim_end_matches('/').to_string(),
            token: credentials.token,
            custom_headers: options.custom_headers,
            retries: options.retries,
        })
    }

    /// API base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join `parts` with `/` and append them to the base URL.
    pub fn make_path<S: AsRef<str>>(&self, parts: &[S]) -> String {
        let mut url = self.base_url.clone();
        for part in parts {
            url.push('/');
            url.push_str(part.as_ref());
        }
        url
    }

    /// Headers for every call: custom headers first, then the standard ones.
    pub fn headers(&self) -> IonQResult<HeaderMap> {
        let token = self.token.as_deref().ok_or(IonQError::MissingToken)?;
        let mut headers = HeaderMap::new();

        for (name, value) in &self.custom_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                HalError::Configuration(format!("Invalid header name '{name}': {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                HalError::Configuration(format!("Invalid value for header '{name}': {e}"))
            })?;
            headers.insert(name, value);
        }

        let mut auth = HeaderValue::from_str(&format!("apiKey {token}"))
            .map_err(|_| HalError::AuthenticationFailed("API token is not a valid header".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let agent = HeaderValue::from_str(&user_agent())
            .map_err(|e| HalError::Configuration(format!("Invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, agent);

        Ok(headers)
    }

    /// One HTTP round trip returning the JSON body (`null` when empty).
    async fn request(&self, method: Method, url: &str, body: Option<&Value>) -> IonQResult<Value> {
        let headers = self.headers()?;
        debug!("{} {}", method, url);

        let mut req = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), status.canonical_reason(), &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Submit a serialized circuit.
    #[instrument(skip(self, request), fields(target = %request.target, shots = request.shots))]
    pub async fn submit(&self, request: &SubmitRequest) -> IonQResult<SubmitResponse> {
        let url = self.make_path(&["jobs"]);
        let body = serde_json::to_value(request)?;
        let (url, body) = (url.as_str(), &body);

        let raw = self
            .retries
            .submit
            .run("submit_job", move || self.request(Method::POST, url, Some(body)))
            .await?;
        let response: SubmitResponse = serde_json::from_value(raw)?;
        info!("Submitted IonQ job {}", response.id);
        Ok(response)
    }

    /// Fetch a job document.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, job_id: &str) -> IonQResult<Value> {
        let url = self.make_path(&["jobs", job_id]);
        let url = url.as_str();
        self.retries
            .retrieve
            .run("retrieve_job", move || self.request(Method::GET, url, None))
            .await
    }

    /// Request cancellation of a job.
    #[instrument(skip(self))]
    pub async fn cancel(&self, job_id: &str) -> IonQResult<Value> {
        let url = self.make_path(&["jobs", job_id, "status", "cancel"]);
        let url = url.as_str();
        let response = self
            .retries
            .cancel
            .run("cancel_job", move || self.request(Method::PUT, url, None))
            .await?;
        info!("Requested cancellation of IonQ job {}", job_id);
        Ok(response)
    }

    /// Delete a job and its data.
    #[instrument(skip(self))]
    pub async fn delete(&self, job_id: &str) -> IonQResult<Value> {
        let url = self.make_path(&["jobs", job_id]);
        let url = url.as_str();
        let response = self
            .retries
            .delete
            .run("delete_job", move || self.request(Method::DELETE, url, None))
            .await?;
        info!("Deleted IonQ job {}", job_id);
        Ok(response)
    }

    /// Look up the characterization of `backend_name`.
    #[instrument(skip(self))]
    pub async fn calibration(&self, backend_name: &str) -> IonQResult<CalibrationLookup> {
        self.retries
            .calibration
            .run("get_calibration_data", move || self.fetch_calibration(backend_name))
            .await
    }

    async fn fetch_calibration(&self, backend_name: &str) -> IonQResult<CalibrationLookup> {
        let listing = self
            .request(Method::GET, &self.make_path(&["backends"]), None)
            .await?;
        let entries: Vec<BackendEntry> = serde_json::from_value(listing)?;

        let characterization_url = match select_backend(&entries, backend_name) {
            Ok(url) => url,
            Err(lookup) => return Ok(lookup),
        };

        let path = characterization_url
            .strip_prefix('/')
            .unwrap_or(characterization_url);
        let raw = self
            .request(Method::GET, &self.make_path(&[path]), None)
            .await?;
        Ok(CalibrationLookup::Found(serde_json::from_value(raw)?))
    }
}

/// Pick the backend entry for `backend_name` and return its characterization
/// URL, or the soft-failure lookup to report instead.
fn select_backend<'a>(
    entries: &'a [BackendEntry],
    backend_name: &str,
) -> Result<&'a str, CalibrationLookup> {
    let matches: Vec<&BackendEntry> = entries
        .iter()
        .filter(|e| {
            e.backend
                .as_deref()
                .is_some_and(|id| backend_name.ends_with(id))
        })
        .collect();

    match matches.as_slice() {
        [] => {
            warn!("No IonQ backend matches '{}'", backend_name);
            Err(CalibrationLookup::NotFound)
        }
        [entry] => match entry.characterization_url.as_deref() {
            Some(url) if !url.is_empty() => Ok(url),
            _ => {
                warn!(
                    "Backend {:?} did not have calibration data",
                    entry.backend.as_deref().unwrap_or_default()
                );
                Err(CalibrationLookup::NoCharacterization)
            }
        },
        many => {
            let ids: Vec<String> = many.iter().filter_map(|e| e.backend.clone()).collect();
            warn!("More than one IonQ backend matches '{}': {:?}", backend_name, ids);
            Err(CalibrationLookup::Ambiguous(ids))
        }
    }
}

/// Build an API error from a non-success response.
///
/// IonQ reports errors as `{"error": {"type": .., "message": ..}}`, or
/// sometimes `{"error": "<type>", "message": ..}`; anything else is kept
/// verbatim.
fn api_error(status: u16, reason: Option<&str>, body: &str) -> IonQError {
    let fallback_type = reason.unwrap_or("unknown").to_string();
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    let (error_type, message) = match parsed.as_ref().and_then(|v| v.get("error")) {
        Some(Value::Object(err)) => (
            err.get("type")
                .and_then(Value::as_str)
                .map_or(fallback_type, str::to_string),
            err.get("message")
                .and_then(Value::as_str)
                .unwrap_or(body)
                .to_string(),
        ),
        Some(Value::String(kind)) => (
            kind.clone(),
            parsed
                .as_ref()
                .and_then(|v| v.get("message"))
                .and_then(Value::as_str)
                .unwrap_or(body)
                .to_string(),
        ),
        _ => (fallback_type, body.to_string()),
    };

    IonQError::Api {
        status,
        error_type,
        message,
    }
}

#[async_trait]
impl IonQApi for IonQClient {
    async fn submit_job(&self, request: &SubmitRequest) -> IonQResult<SubmitResponse> {
        self.submit(request).await
    }

    async fn retrieve_job(&self, job_id: &str) -> IonQResult<Value> {
        self.retrieve(job_id).await
    }

    async fn cancel_job(&self, job_id: &str) -> IonQResult<Value> {
        self.cancel(job_id).await
    }

    async fn delete_job(&self, job_id: &str) -> IonQResult<Value> {
        self.delete(job_id).await
    }

    async fn get_calibration_data(&self, backend_name: &str) -> IonQResult<CalibrationLookup> {
        self.calibration(backend_name).await
    }
}
