//! # Dispatch Error Classification
//!
//! Decides, for every failed dispatch attempt, whether the task may be retried and how long
//! to wait first. Validation and auth failures are terminal; everything else reported by an
//! executor (timeouts included) is transient and follows the backoff schedule until the
//! task's attempt budget is spent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::RouterError;
use crate::resilience::BackoffPolicy;

/// Context information for error classification
#[derive(Debug, Clone)]
pub struct ErrorContext<'a> {
    /// Service the failed attempt was sent to, if one was selected
    pub service_id: Option<&'a str>,
    /// Current attempt number (1-based)
    pub attempt_number: u32,
    /// Maximum allowed attempts
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid request - never retried
    Validation,
    /// Caller not permitted - never retried
    Auth,
    /// May succeed on retry
    Transient,
    /// Executor did not settle in time - retried like transient errors
    Timeout,
    /// Not caused by the executor (no candidates, bad state) - never retried
    Fatal,
}

impl ErrorCategory {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ErrorCategory::Validation | ErrorCategory::Auth | ErrorCategory::Fatal
        )
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "Validation"),
            ErrorCategory::Auth => write!(f, "Auth"),
            ErrorCategory::Transient => write!(f, "Transient"),
            ErrorCategory::Timeout => write!(f, "Timeout"),
            ErrorCategory::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Result of error classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorClassification {
    pub error_category: ErrorCategory,
    pub is_retryable: bool,
    /// Delay before the next attempt (if retryable)
    pub retry_delay: Option<Duration>,
    pub error_code: String,
    pub error_message: String,
    pub is_final_attempt: bool,
}

/// Trait for error classification strategies
pub trait ErrorClassifier: Send + Sync {
    fn classify_error(&self, error: &RouterError, context: &ErrorContext<'_>)
        -> ErrorClassification;

    fn classifier_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Default)]
pub struct StandardErrorClassifier {
    backoff: BackoffPolicy,
}

impl StandardErrorClassifier {
    pub fn new(backoff: BackoffPolicy) -> Self {
        Self { backoff }
    }

    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    pub fn category_of(error: &RouterError) -> ErrorCategory {
        match error {
            RouterError::Validation(_) => ErrorCategory::Validation,
            RouterError::Auth(_) => ErrorCategory::Auth,
            RouterError::Transient(_) => ErrorCategory::Transient,
            RouterError::Timeout { .. } => ErrorCategory::Timeout,
            RouterError::NoAvailableService { .. }
            | RouterError::Configuration(_)
            | RouterError::InvalidState(_) => ErrorCategory::Fatal,
        }
    }
}

impl ErrorClassifier for StandardErrorClassifier {
    fn classify_error(
        &self,
        error: &RouterError,
        context: &ErrorContext<'_>,
    ) -> ErrorClassification {
        let error_category = Self::category_of(error);
        let is_final_attempt = context.attempt_number >= context.max_attempts;
        let is_retryable = !error_category.is_terminal() && !is_final_attempt;
        let retry_delay =
            is_retryable.then(|| self.backoff.delay_for_attempt(context.attempt_number));

        ErrorClassification {
            error_category,
            is_retryable,
            retry_delay,
            error_code: error.code().to_string(),
            error_message: error.to_string(),
            is_final_attempt,
        }
    }

    fn classifier_name(&self) -> &'static str {
        "standard"
    }
}
