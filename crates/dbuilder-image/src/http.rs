//! HTTP access to registries.
//!
//! Registry code only needs a blocking `GET` that reports the status and
//! body, so it talks to the [`HttpClient`] trait and tests substitute a
//! canned implementation.

use dbuilder_common::constants::{APP_NAME, REGISTRY_REQUEST_TIMEOUT};
use dbuilder_common::error::{DbuilderError, Result};

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// A blocking HTTP `GET`.
pub trait HttpClient {
    /// Fetches `url`, verifying TLS certificates when `verify_certs` is set.
    ///
    /// # Errors
    ///
    /// Returns `DbuilderError::RegistryRequest` if no response was received.
    fn get(&self, url: &str, verify_certs: bool) -> Result<HttpResponse>;
}

/// [`HttpClient`] backed by `reqwest::blocking`.
///
/// Holds one client per verification mode so repeated probes reuse
/// connections.
#[derive(Debug)]
pub struct BlockingHttpClient {
    verifying: reqwest::blocking::Client,
    insecure: reqwest::blocking::Client,
}

impl BlockingHttpClient {
    /// Builds both underlying clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        Ok(Self {
            verifying: build_client(true)?,
            insecure: build_client(false)?,
        })
    }
}

fn build_client(verify_certs: bool) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(format!("{APP_NAME}/{}", env!("CARGO_PKG_VERSION")))
        .timeout(REGISTRY_REQUEST_TIMEOUT)
        .danger_accept_invalid_certs(!verify_certs)
        .build()
        .map_err(|e| DbuilderError::Config {
            message: format!("failed to initialize {APP_NAME} HTTP client: {e}"),
        })
}

impl HttpClient for BlockingHttpClient {
    fn get(&self, url: &str, verify_certs: bool) -> Result<HttpResponse> {
        tracing::debug!(url, verify_certs, "GET");
        let client = if verify_certs {
            &self.verifying
        } else {
            &self.insecure
        };

        let response = client
            .get(url)
            .send()
            .map_err(|e| DbuilderError::RegistryRequest {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| DbuilderError::RegistryRequest {
            url: url.to_string(),
            reason: format!("failed to read response body: {e}"),
        })?;

        tracing::debug!(url, status, "response received");
        Ok(HttpResponse { status, body })
    }
}
