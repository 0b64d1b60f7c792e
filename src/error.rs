//! Error types for the Proxima library.
//!
//! All errors are represented by the [`ProximaError`] enum. Configuration
//! problems (an operator the retrieval model cannot score, a bad weight
//! vector, a zero proximity span) are reported as [`ProximaError::Config`]
//! and are never recovered from. Inconsistent index data surfaces as
//! [`ProximaError::Data`].
//!
//! # Examples
//!
//! ```
//! use proxima::error::{ProximaError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ProximaError::config("#NEAR/0 is not a valid span"))
//! }
//!
//! assert!(example_operation().is_err());
//! ```

use thiserror::Error;

/// The main error type for Proxima operations.
#[derive(Error, Debug)]
pub enum ProximaError {
    /// Invalid query or model configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed posting or position data.
    #[error("Data error: {0}")]
    Data(String),

    /// Failed lookup against the index collaborator.
    #[error("Index error: {0}")]
    Index(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with ProximaError.
pub type Result<T> = std::result::Result<T, ProximaError>;

impl ProximaError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ProximaError::Config(msg.into())
    }

    /// Create a new data error.
    pub fn data<S: Into<String>>(msg: S) -> Self {
        ProximaError::Data(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        ProximaError::Index(msg.into())
    }

    /// Create an error for an operator the retrieval model cannot score.
    pub fn unsupported<M: AsRef<str>, O: AsRef<str>>(model: M, operator: O) -> Self {
        ProximaError::Config(format!(
            "{} doesn't support the {} operator",
            model.as_ref(),
            operator.as_ref()
        ))
    }

    /// Whether this error is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, ProximaError::Config(_))
    }
}
