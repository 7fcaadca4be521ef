//! Error types for Mission Architect
//!
//! Provides the crate-wide error taxonomy. Librarian-level failures are
//! converted to inline text before they reach the model; only engine and
//! infrastructure failures propagate as `ArchitectError`.

use thiserror::Error;

/// Main error type for the Mission Architect system
#[derive(Error, Debug)]
pub enum ArchitectError {
    /// GitHub throttled the (unauthenticated) API caller
    #[error("GitHub API Rate Limit Exceeded. Please wait an hour or try again later.")]
    RateLimited,

    /// Non-2xx, non-rate-limit status from the tree listing endpoint
    #[error("GitHub API Error: {status}")]
    Upstream { status: u16 },

    /// Raw content download returned a non-success status
    #[error("Failed to download source file: {url}")]
    RawFetch { url: String },

    /// Fuzzy resolution found nothing; carries up to 5 suggested paths
    #[error("Module '{module}' not found in {repo}")]
    ModuleNotFound {
        module: String,
        repo: String,
        suggestions: Vec<String>,
    },

    /// A send was attempted before a model session existed
    #[error("Chat session not initialized")]
    SessionNotInitialized,

    /// Model session creation was rejected by the API
    #[error("Session creation failed: {0}")]
    SessionCreation(String),

    /// Streaming errors (mid-stream decode or connection loss)
    #[error("Streaming error: {0}")]
    StreamingError(String),

    /// Invalid state transition in the engine phase machine
    #[error("Invalid phase transition from {from:?} to {to:?}")]
    InvalidTransition { from: String, to: String },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for Mission Architect operations
pub type Result<T> = std::result::Result<T, ArchitectError>;

/// Convert anyhow errors to ArchitectError
impl From<anyhow::Error> for ArchitectError {
    fn from(err: anyhow::Error) -> Self {
        ArchitectError::Generic(err.to_string())
    }
}

impl ArchitectError {
    /// True when the failure is a network-level loss rather than an API
    /// rejection. Used to pick the user-facing hint after a failed turn.
    pub fn is_network(&self) -> bool {
        match self {
            ArchitectError::HttpError(e) => e.is_connect() || e.is_timeout(),
            ArchitectError::StreamingError(msg) => {
                msg.contains("connection") || msg.contains("Connection")
            }
            _ => false,
        }
    }
}
