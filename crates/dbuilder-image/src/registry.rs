//! Registry API negotiation and tag listing.
//!
//! A host is probed for the V2 API first and the V1 API second; the first
//! well-known endpoint answering `200 OK` decides which wire format is used
//! for tag listing.

use std::fmt;

use dbuilder_common::error::{DbuilderError, Result};
use serde::Deserialize;

use crate::http::HttpClient;

/// Registry API generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryVersion {
    /// Legacy `/v1/` API.
    V1,
    /// Docker Registry HTTP API V2.
    V2,
}

impl RegistryVersion {
    /// Probe order: modern hosts should never see V1-only requests.
    const PROBE_ORDER: [Self; 2] = [Self::V2, Self::V1];

    fn probe_url(self, host: &str) -> String {
        match self {
            Self::V1 => format!("https://{host}/v1/_ping"),
            Self::V2 => format!("https://{host}/v2/"),
        }
    }

    fn tags_url(self, host: &str, image_full_name: &str) -> String {
        match self {
            Self::V1 => format!("https://{host}/v1/repositories/{image_full_name}/tags"),
            Self::V2 => format!("https://{host}/v2/{image_full_name}/tags/list"),
        }
    }
}

impl fmt::Display for RegistryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

/// Where a registry lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    verify_certs: bool,
}

/// A registry whose API version has been negotiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registry {
    /// Host speaking the V1 API.
    V1(Endpoint),
    /// Host speaking the V2 API.
    V2(Endpoint),
}

#[derive(Deserialize)]
struct TagList {
    tags: Option<Vec<String>>,
}

impl Registry {
    /// Probes `host` and returns the first API version that answers.
    ///
    /// A failed probe only means that version is absent; transport errors
    /// are treated the same as a non-200 status.
    ///
    /// # Errors
    ///
    /// Returns `DbuilderError::UnrecognizedRegistry` if no version answers.
    pub fn create(client: &dyn HttpClient, host: &str, verify_certs: bool) -> Result<Self> {
        for version in RegistryVersion::PROBE_ORDER {
            let url = version.probe_url(host);
            match client.get(&url, verify_certs) {
                Ok(response) if response.status == 200 => {
                    tracing::info!(host, %version, "registry API detected");
                    return Ok(Self::new(version, host, verify_certs));
                }
                Ok(response) => {
                    tracing::debug!(url = %url, status = response.status, "registry probe declined");
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "registry probe failed");
                }
            }
        }
        Err(DbuilderError::UnrecognizedRegistry {
            host: host.to_string(),
        })
    }

    /// Builds a registry of a known version without probing.
    #[must_use]
    pub fn new(version: RegistryVersion, host: &str, verify_certs: bool) -> Self {
        let endpoint = Endpoint {
            host: host.to_string(),
            verify_certs,
        };
        match version {
            RegistryVersion::V1 => Self::V1(endpoint),
            RegistryVersion::V2 => Self::V2(endpoint),
        }
    }

    /// Negotiated API version.
    pub const fn version(&self) -> RegistryVersion {
        match self {
            Self::V1(_) => RegistryVersion::V1,
            Self::V2(_) => RegistryVersion::V2,
        }
    }

    const fn endpoint(&self) -> &Endpoint {
        match self {
            Self::V1(endpoint) | Self::V2(endpoint) => endpoint,
        }
    }

    /// Registry host.
    pub fn host(&self) -> &str {
        &self.endpoint().host
    }

    /// Whether TLS certificates are verified.
    pub const fn verify_certs(&self) -> bool {
        self.endpoint().verify_certs
    }

    /// Lists the tags of `image_full_name` (`namespace/name` or `name`).
    ///
    /// Tags come back in the order the registry sent them.
    ///
    /// # Errors
    ///
    /// Returns `DbuilderError::RegistryRequest` on a failed or non-2xx
    /// request and `DbuilderError::RegistryResponse` if the body does not
    /// have the expected shape.
    pub fn list_tags(&self, client: &dyn HttpClient, image_full_name: &str) -> Result<Vec<String>> {
        let url = self.version().tags_url(self.host(), image_full_name);
        let response = client.get(&url, self.verify_certs())?;
        if !response.is_success() {
            return Err(DbuilderError::RegistryRequest {
                url,
                reason: format!("HTTP {}", response.status),
            });
        }

        let tags: Vec<String> = match self {
            Self::V1(_) => serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(
                &response.body,
            )
            .map(|tags| tags.into_iter().map(|(tag, _)| tag).collect()),
            Self::V2(_) => serde_json::from_str::<TagList>(&response.body)
                .map(|list| list.tags.unwrap_or_default()),
        }
        .map_err(|e| DbuilderError::RegistryResponse {
            url: url.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!(url = %url, count = tags.len(), "listed registry tags");
        Ok(tags)
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "registry {} at {}", self.version(), self.host())
    }
}
