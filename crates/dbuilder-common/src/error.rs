//! Unified error types for the dbuilder workspace.
//!
//! Every failure is fatal for a generation run: nothing is retried and
//! nothing is downgraded to a warning.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum DbuilderError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A configuration file is not valid YAML for the expected shape.
    #[error("failed to parse configuration {path}: {source}")]
    Yaml {
        /// Configuration file being parsed.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// An image reference has no image name once host, namespace and tag
    /// are split off.
    #[error("malformed image reference \"{reference}\": image name is empty")]
    MalformedReference {
        /// The raw reference as written in the configuration.
        reference: String,
    },

    /// Neither the V2 nor the V1 registry API answered the probe.
    #[error("registry not recognized: {host} answers neither the v2 nor the v1 API")]
    UnrecognizedRegistry {
        /// Registry host that was probed.
        host: String,
    },

    /// A registry request failed or returned a non-success status.
    #[error("registry request to {url} failed: {reason}")]
    RegistryRequest {
        /// Requested URL.
        url: String,
        /// HTTP status or transport failure description.
        reason: String,
    },

    /// A registry answered with a body that does not have the expected shape.
    #[error("unexpected registry response from {url}: {message}")]
    RegistryResponse {
        /// Requested URL.
        url: String,
        /// Description of the parse failure.
        message: String,
    },

    /// Two packages, templates or tags render to the same Dockerfile name.
    #[error("{filename} has already been processed")]
    DuplicateArtifact {
        /// The colliding Dockerfile name.
        filename: String,
    },

    /// A template could not be rendered.
    #[error("failed to render template {path}: {message}")]
    Template {
        /// Template file path.
        path: PathBuf,
        /// Rendering error chain.
        message: String,
    },
}

impl DbuilderError {
    /// Builds an [`DbuilderError::Io`] for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DbuilderError>;
