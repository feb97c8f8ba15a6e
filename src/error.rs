//! Error taxonomy for campaign analysis
//!
//! Validation errors are raised at the API boundary before any computation
//! starts. Nothing in the crate returns a silently truncated result.

use thiserror::Error;

/// Errors produced by the analysis core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Malformed hierarchy input (empty path list, no common root, empty segment)
    #[error("Structural error: {0}")]
    Structural(String),

    /// Statistical routine invoked on an empty or too-small population
    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// API contract violation (odd window size, confidence outside (0, 1), ...)
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A configured field that no record and no golden entry carries
    #[error("Missing field: {0}")]
    MissingField(String),
}

impl AnalysisError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn insufficient(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
