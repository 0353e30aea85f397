//! Blocking HTTP transport for the networked service.

use std::time::Duration;

use serde::Deserialize;
use tracing::trace;

use super::{RemoteCall, Reply, TransportError};

/// Base URL of the public teaching instance of the service.
pub const DEFAULT_BASE_URL: &str = "http://nerc.itmo.ru/teaching/os/networkfs/v1";

/// Default request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Envelope every service response is wrapped in.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: i64,
    #[serde(default)]
    response: serde_json::Value,
}

/// Real transport using reqwest.
///
/// Requests are `GET {base_url}/{token}/fs/{operation}?key=value&...`.
/// Values are appended as given: they are either numbers, fixed words, or
/// output of the name encoder, all of which are already URL-safe.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a transport with a custom timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TransportError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the request URL for one call.
    pub fn url(&self, token: &str, operation: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/{}/fs/{}", self.base_url, token, operation);
        for (i, (key, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(value);
        }
        url
    }
}

impl RemoteCall for HttpTransport {
    fn invoke(
        &self,
        token: &str,
        operation: &str,
        params: &[(&str, String)],
    ) -> Result<Reply, TransportError> {
        let url = self.url(token, operation, params);
        trace!(operation, "HTTP GET");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| TransportError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TransportError(format!(
                "HTTP {} from operation {}",
                response.status(),
                operation
            )));
        }

        let body = response
            .bytes()
            .map_err(|e| TransportError(format!("Failed to read response: {}", e)))?;

        parse_envelope(&body)
    }
}

fn parse_envelope(body: &[u8]) -> Result<Reply, TransportError> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| TransportError(format!("Invalid response body: {}", e)))?;
    Ok(Reply {
        status: envelope.status,
        payload: envelope.response,
    })
}
