//! Error types for the dnsync system
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for dnsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the dnsync system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (fatal, raised before any remote call)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote rejected the profile credentials (HTTP 401)
    #[error("Authentication failed: invalid API key ({body})")]
    Authentication {
        /// Response body echoed by the remote
        body: String,
    },

    /// The remote refused access to the profile (HTTP 403)
    #[error("Authorization failed: access forbidden ({body})")]
    Authorization {
        /// Response body echoed by the remote
        body: String,
    },

    /// Any other non-2xx response from the remote API
    #[error("Remote API error (HTTP {status}): {body}")]
    RemoteApi {
        /// HTTP status code
        status: u16,
        /// Response body echoed by the remote
        body: String,
    },

    /// Transport-level HTTP errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Source list fetch or parse errors
    #[error("Source list error: {0}")]
    Source(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a source list error
    pub fn source_list(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a remote API error from a status code and response body
    pub fn remote_api(status: u16, body: impl Into<String>) -> Self {
        Self::RemoteApi {
            status,
            body: body.into(),
        }
    }

    /// Whether this error must stop the whole run.
    ///
    /// Rejected credentials (401/403) are fatal: the run ends immediately
    /// instead of moving on to the next profile.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Authorization { .. })
    }
}
