//! Credential resolution.
//!
//! Precedence, per field: explicit argument, then environment, then default.
//! Empty strings count as absent.

use std::fmt;

/// Default IonQ API endpoint.
pub const DEFAULT_URL: &str = "https://api.ionq.co/v0.1";

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "IONQ_API_TOKEN";

/// Environment variable overriding the API endpoint.
pub const URL_ENV: &str = "IONQ_API_URL";

/// Resolved token and base URL.
#[derive(Clone, PartialEq, Eq)]
pub struct IonQCredentials {
    /// API key; `None` leaves authenticated calls failing with `MissingToken`.
    pub token: Option<String>,
    /// API base URL.
    pub url: String,
}

impl fmt::Debug for IonQCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IonQCredentials")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("url", &self.url)
            .finish()
    }
}

/// Resolve credentials from arguments and the process environment.
pub fn resolve_credentials(token: Option<String>, url: Option<String>) -> IonQCredentials {
    resolve_credentials_with(token, url, |key| std::env::var(key).ok())
}

/// Resolve credentials with an explicit environment lookup.
pub fn resolve_credentials_with(
    token: Option<String>,
    url: Option<String>,
    env: impl Fn(&str) -> Option<String>,
) -> IonQCredentials {
    let token = non_empty(token).or_else(|| non_empty(env(TOKEN_ENV)));
    let url = non_empty(url)
        .or_else(|| non_empty(env(URL_ENV)))
        .unwrap_or_else(|| DEFAULT_URL.to_string());
    IonQCredentials { token, url }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
