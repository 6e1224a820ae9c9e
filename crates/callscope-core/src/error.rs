//! Error types for Callscope Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown report kind: {0}")]
    UnknownReport(String),

    #[error("Upstream fetch failed{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    UpstreamFetch {
        status: Option<u16>,
        message: String,
    },

    // Multi-tenancy errors
    #[error("Invalid tenant: {0}")]
    InvalidTenant(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a failed operation may be retried.
    ///
    /// Only upstream fetch failures (network/HTTP) are transient; everything
    /// else fails fast.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::UpstreamFetch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
