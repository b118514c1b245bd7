//! Common error types for services

use thiserror::Error;

/// Service error types
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Connection failed error
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Remote endpoint answered with a non-success status
    #[error("Delivery rejected with status {status}: {body}")]
    DeliveryRejected {
        /// HTTP status code returned by the remote endpoint
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Invalid request error
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else if err.is_builder() {
            Self::Configuration(err.to_string())
        } else {
            Self::InvalidRequest(err.to_string())
        }
    }
}

/// Result alias for service plumbing
pub type ServiceResult<T> = Result<T, ServiceError>;
