//! Error types for the option chain analyzer

use thiserror::Error;

/// Analyzer error taxonomy. Every variant aborts the current pass.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Network failure, timeout, non-success status or malformed payload
    #[error("Upstream fetch failed: {reason}")]
    UpstreamFetch {
        /// What went wrong talking to the chain source
        reason: String,
    },

    /// A record is missing fields the pipeline depends on
    #[error("Unexpected data shape: {message}")]
    DataShape {
        /// Which field or record was invalid
        message: String,
    },

    /// A pricing input violated its precondition
    #[error("Math domain error: {message}")]
    MathDomain {
        /// The offending inputs
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Configuration error message detailing what went wrong
        message: String,
    },
}

impl AnalyzerError {
    pub fn upstream(reason: impl Into<String>) -> Self {
        Self::UpstreamFetch { reason: reason.into() }
    }

    pub fn data_shape(message: impl Into<String>) -> Self {
        Self::DataShape { message: message.into() }
    }

    pub fn math_domain(message: impl Into<String>) -> Self {
        Self::MathDomain { message: message.into() }
    }
}

impl From<reqwest::Error> for AnalyzerError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timeout"
        } else if err.is_connect() {
            "connect"
        } else if err.is_decode() {
            "malformed payload"
        } else {
            "request"
        };
        Self::upstream(format!("{kind}: {err}"))
    }
}

/// Type alias for analyzer results
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;
