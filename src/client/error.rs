//! Client error types

use thiserror::Error;

/// A failed remote load
///
/// Transport errors, non-2xx statuses and undecodable bodies are all the
/// same failure to the caller: the message ends up in the error cell.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request failed with status code {status}")]
    Status { status: u16 },

    #[error("{0}")]
    Decode(#[from] serde_json::Error),
}

impl LoadError {
    /// Message stored in the error cell: `"{prefix}: {self}"`
    pub fn describe(&self, prefix: &str) -> String {
        format!("{}: {}", prefix, self)
    }
}

/// Errors raised while constructing clients
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}
