//! # Routing Configuration
//!
//! Typed configuration for the routing engine. Every field has a default matching the
//! engine's documented behavior, so an empty configuration source is valid.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use routing_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Loads config/routing.{toml,yaml,json}, the environment overlay, then ROUTING__* variables
//! let manager = ConfigManager::load()?;
//!
//! let threshold = manager.config().circuit_breaker.failure_threshold;
//! let tick = manager.config().queue.tick_interval();
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::defaults;
use crate::error::{Result, RouterError};
use crate::resilience::{BackoffPolicy, CircuitBreakerConfig};

pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub circuit_breaker: CircuitBreakerSettings,
    pub health: HealthSettings,
    pub queue: QueueSettings,
    pub scoring: ScoringSettings,
    pub history: HistorySettings,
    pub retry: RetrySettings,
    pub tasks: TaskDefaults,
    pub events: EventSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Consecutive failures before a breaker opens
    pub failure_threshold: u32,
    /// How long a breaker stays open before admitting test traffic
    pub timeout_ms: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: defaults::CIRCUIT_BREAKER_THRESHOLD,
            timeout_ms: defaults::CIRCUIT_BREAKER_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    pub check_interval_ms: u64,
    pub probe_timeout_ms: u64,
    /// Probe candidates with no cached health record before filtering
    pub probe_unknown_on_route: bool,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            check_interval_ms: defaults::HEALTH_CHECK_INTERVAL_MS,
            probe_timeout_ms: defaults::HEALTH_PROBE_TIMEOUT_MS,
            probe_unknown_on_route: true,
        }
    }
}

impl HealthSettings {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    pub tick_interval_ms: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: defaults::QUEUE_TICK_INTERVAL_MS,
        }
    }
}

impl QueueSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    /// Services that receive the high-priority bonus
    pub priority_capable_services: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Ring buffer capacity for routing decisions
    pub capacity: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            capacity: defaults::DECISION_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            max_delay_ms: defaults::RETRY_MAX_DELAY_MS,
        }
    }
}

/// Defaults applied to tasks created through [`crate::models::Task::with_defaults`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDefaults {
    pub timeout_ms: u64,
    pub max_retries: u32,
}

impl Default for TaskDefaults {
    fn default() -> Self {
        Self {
            timeout_ms: defaults::TASK_TIMEOUT_MS,
            max_retries: defaults::TASK_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    pub channel_capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            channel_capacity: defaults::EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl RouterConfig {
    /// Reject values the engine cannot operate with
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.circuit_breaker.failure_threshold == 0 {
            problems.push("circuit_breaker.failure_threshold must be greater than 0");
        }
        if self.circuit_breaker.timeout_ms == 0 {
            problems.push("circuit_breaker.timeout_ms must be greater than 0");
        }
        if self.health.check_interval_ms == 0 {
            problems.push("health.check_interval_ms must be greater than 0");
        }
        if self.health.probe_timeout_ms == 0 {
            problems.push("health.probe_timeout_ms must be greater than 0");
        }
        if self.queue.tick_interval_ms == 0 {
            problems.push("queue.tick_interval_ms must be greater than 0");
        }
        if self.history.capacity == 0 {
            problems.push("history.capacity must be greater than 0");
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            problems.push("retry.max_delay_ms must not be less than retry.base_delay_ms");
        }
        if self.tasks.timeout_ms == 0 {
            problems.push("tasks.timeout_ms must be greater than 0");
        }
        if self.events.channel_capacity == 0 {
            problems.push("events.channel_capacity must be greater than 0");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(RouterError::Configuration(problems.join("; ")))
        }
    }

    pub fn circuit_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.circuit_breaker.failure_threshold,
            timeout: Duration::from_millis(self.circuit_breaker.timeout_ms),
        }
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.retry.base_delay_ms),
            Duration::from_millis(self.retry.max_delay_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_documented_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.timeout_ms, 60_000);
        assert_eq!(config.health.check_interval(), Duration::from_secs(30));
        assert_eq!(config.queue.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.history.capacity, 1000);
        assert_eq!(config.tasks.timeout_ms, 30_000);
        assert_eq!(config.tasks.max_retries, 3);
        assert!(config.scoring.priority_capable_services.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_collects_all_problems() {
        let mut config = RouterConfig::default();
        config.circuit_breaker.failure_threshold = 0;
        config.history.capacity = 0;
        config.retry.base_delay_ms = 5_000;
        config.retry.max_delay_ms = 1_000;

        let err = config.validate().unwrap_err();
        let message = err.to_string();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
        assert!(message.contains("failure_threshold"));
        assert!(message.contains("history.capacity"));
        assert!(message.contains("retry.max_delay_ms"));
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: RouterConfig = serde_json::from_value(serde_json::json!({
            "circuit_breaker": { "failure_threshold": 2 },
            "scoring": { "priority_capable_services": ["router-primary"] }
        }))
        .unwrap();

        assert_eq!(config.circuit_breaker.failure_threshold, 2);
        assert_eq!(config.circuit_breaker.timeout_ms, 60_000);
        assert_eq!(config.scoring.priority_capable_services, vec!["router-primary"]);
        assert_eq!(config.retry, RetrySettings::default());
    }

    #[test]
    fn test_conversions() {
        let config = RouterConfig::default();
        let breaker = config.circuit_breaker_config();
        assert_eq!(breaker.failure_threshold, 5);
        assert_eq!(breaker.timeout, Duration::from_secs(60));

        let backoff = config.backoff_policy();
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_secs(1));
    }
}
