//! Error types for loopos
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in loopos
#[derive(Debug, Error)]
pub enum LooposError {
    /// Loop configuration is inconsistent (e.g. deep mode below depth 3)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A scoring utility received out-of-range or mismatched input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for loopos operations
pub type Result<T> = std::result::Result<T, LooposError>;
