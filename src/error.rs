//! # Error Types
//!
//! Crate-wide error taxonomy for the routing engine.
//!
//! Executors report failures as [`ExecutorError`], carrying an [`ErrorCode`] that the
//! router uses for retry classification. Everything the router surfaces to callers is a
//! [`RouterError`], which always exposes a stable string code through [`RouterError::code`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification code attached to executor failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The request itself is invalid; retrying cannot help
    ValidationError,
    /// The caller is not allowed to perform the request; retrying cannot help
    AuthError,
    /// Anything else, treated as transient
    Unclassified,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::AuthError => write!(f, "AUTH_ERROR"),
            ErrorCode::Unclassified => write!(f, "UNCLASSIFIED"),
        }
    }
}

/// Failure reported by an executor or a health probe
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ExecutorError {
    pub code: ErrorCode,
    pub message: String,
}

impl ExecutorError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthError, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unclassified, message)
    }
}

/// Errors surfaced by the routing engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    /// No candidate survived circuit breaker and health filtering
    #[error("No available service for task: {description}")]
    NoAvailableService { description: String },

    /// Terminal validation failure reported by the executor
    #[error("Validation error: {0}")]
    Validation(String),

    /// Terminal authentication/authorization failure reported by the executor
    #[error("Auth error: {0}")]
    Auth(String),

    /// Retryable executor failure
    #[error("Transient error: {0}")]
    Transient(String),

    /// Executor call did not settle within the task timeout
    #[error("Task timed out after {timeout_ms}ms on service {service_id}")]
    Timeout { service_id: String, timeout_ms: u64 },

    /// Invalid or unloadable configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Operation not permitted in the current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl RouterError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            RouterError::NoAvailableService { .. } => "NO_AVAILABLE_SERVICE",
            RouterError::Validation(_) => "VALIDATION_ERROR",
            RouterError::Auth(_) => "AUTH_ERROR",
            RouterError::Transient(_) => "TRANSIENT_ERROR",
            RouterError::Timeout { .. } => "TIMEOUT",
            RouterError::Configuration(_) => "CONFIGURATION_ERROR",
            RouterError::InvalidState(_) => "INVALID_STATE",
        }
    }
}

impl From<ExecutorError> for RouterError {
    fn from(error: ExecutorError) -> Self {
        match error.code {
            ErrorCode::ValidationError => RouterError::Validation(error.message),
            ErrorCode::AuthError => RouterError::Auth(error.message),
            ErrorCode::Unclassified => RouterError::Transient(error.message),
        }
    }
}

impl From<::config::ConfigError> for RouterError {
    fn from(error: ::config::ConfigError) -> Self {
        RouterError::Configuration(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;
