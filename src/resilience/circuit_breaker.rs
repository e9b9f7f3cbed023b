//! # Circuit Breaker Registry
//!
//! Per-service failure tracking with three states: Closed (normal operation), Open (calls
//! rejected) and Half-Open (test traffic admitted). Entries are created lazily on first
//! failure; a service with no entry behaves as closed with zero failures.
//!
//! The Open → Half-Open transition is lazy: it happens inside [`CircuitBreakerRegistry::is_available`]
//! once `timeout` has elapsed since the last failure, never on a timer. Every mutation is a
//! single synchronous step under the map's shard lock, so no update spans an `.await`.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::constants::defaults;
use crate::events::{EventPublisher, RoutingEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    #[default]
    Closed,
    /// Failure mode - the service is filtered out
    Open,
    /// Testing recovery - traffic admitted, next outcome decides the state
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: defaults::CIRCUIT_BREAKER_THRESHOLD,
            timeout: Duration::from_millis(defaults::CIRCUIT_BREAKER_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    /// Monotonic instant of the last failure, used for the open window
    #[serde(skip)]
    pub last_failure_at: Option<Instant>,
    /// Wall-clock time of the last failure, for reporting
    pub last_failure_time: Option<DateTime<Utc>>,
}

/// Process-wide registry of per-service breakers
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: DashMap<String, CircuitBreakerState>,
    events: Option<EventPublisher>,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        debug!(
            failure_threshold = config.failure_threshold,
            timeout_ms = config.timeout.as_millis() as u64,
            "🛡️ Circuit breaker registry initialized"
        );

        Self {
            config,
            breakers: DashMap::new(),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventPublisher) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Record a failed call; opens the breaker once the threshold is reached
    pub fn record_failure(&self, service_id: &str) {
        let opened = {
            let mut entry = self.breakers.entry(service_id.to_string()).or_default();
            entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
            entry.last_failure_at = Some(Instant::now());
            entry.last_failure_time = Some(Utc::now());

            if entry.consecutive_failures >= self.config.failure_threshold
                && entry.state != CircuitState::Open
            {
                entry.state = CircuitState::Open;
                Some(entry.consecutive_failures)
            } else {
                None
            }
        };

        if let Some(consecutive_failures) = opened {
            error!(
                service_id = %service_id,
                consecutive_failures = consecutive_failures,
                failure_threshold = self.config.failure_threshold,
                timeout_ms = self.config.timeout.as_millis() as u64,
                "🔴 Circuit breaker opened"
            );
            self.emit(RoutingEvent::CircuitOpened {
                service_id: service_id.to_string(),
                consecutive_failures,
            });
        } else {
            debug!(service_id = %service_id, "Failure recorded");
        }
    }

    /// Record a successful call; resets the failure count and closes the breaker
    pub fn record_success(&self, service_id: &str) {
        let closed = match self.breakers.get_mut(service_id) {
            Some(mut entry) => {
                entry.consecutive_failures = 0;
                if entry.state != CircuitState::Closed {
                    entry.state = CircuitState::Closed;
                    true
                } else {
                    false
                }
            }
            None => false,
        };

        if closed {
            info!(service_id = %service_id, "🟢 Circuit breaker closed (recovered)");
            self.emit(RoutingEvent::CircuitClosed {
                service_id: service_id.to_string(),
            });
        }
    }

    /// Whether traffic may be sent to the service, applying the lazy half-open transition
    pub fn is_available(&self, service_id: &str) -> bool {
        let Some(mut entry) = self.breakers.get_mut(service_id) else {
            return true;
        };

        match entry.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let window_elapsed = entry
                    .last_failure_at
                    .map(|at| at.elapsed() >= self.config.timeout)
                    .unwrap_or(true);

                if window_elapsed {
                    entry.state = CircuitState::HalfOpen;
                    info!(
                        service_id = %service_id,
                        consecutive_failures = entry.consecutive_failures,
                        "🟡 Circuit breaker half-open (testing recovery)"
                    );
                }
                window_elapsed
            }
        }
    }

    /// Keep only the services whose breaker admits traffic, preserving order
    pub fn filter_available(&self, service_ids: &[String]) -> Vec<String> {
        service_ids
            .iter()
            .filter(|id| self.is_available(id))
            .cloned()
            .collect()
    }

    /// Current state without applying any transition
    pub fn state(&self, service_id: &str) -> CircuitState {
        self.breakers
            .get(service_id)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    pub fn snapshot(&self, service_id: &str) -> CircuitBreakerState {
        self.breakers
            .get(service_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    pub fn snapshot_all(&self) -> BTreeMap<String, CircuitBreakerState> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn emit(&self, event: RoutingEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(threshold: u32, timeout_ms: u64) -> CircuitBreakerRegistry {
        CircuitBreakerRegistry::new(CircuitBreakerConfig {
            failure_threshold: threshold,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    #[test]
    fn test_unknown_service_is_closed_and_available() {
        let registry = CircuitBreakerRegistry::default();
        assert!(registry.is_available("svc-a"));
        assert_eq!(registry.state("svc-a"), CircuitState::Closed);
        assert_eq!(registry.snapshot("svc-a").consecutive_failures, 0);
        assert!(registry.snapshot_all().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_at_threshold() {
        let registry = registry(3, 1_000);

        registry.record_failure("svc-a");
        registry.record_failure("svc-a");
        assert!(registry.is_available("svc-a"));
        assert_eq!(registry.state("svc-a"), CircuitState::Closed);

        registry.record_failure("svc-a");
        assert!(!registry.is_available("svc-a"));
        assert_eq!(registry.state("svc-a"), CircuitState::Open);
        assert_eq!(registry.snapshot("svc-a").consecutive_failures, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_half_open_after_timeout() {
        let registry = registry(1, 1_000);
        registry.record_failure("svc-a");

        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(!registry.is_available("svc-a"));

        tokio::time::advance(Duration::from_millis(1)).await;
        // Reading state alone does not transition
        assert_eq!(registry.state("svc-a"), CircuitState::Open);
        assert!(registry.is_available("svc-a"));
        assert_eq!(registry.state("svc-a"), CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_success_closes() {
        let events = EventPublisher::new(8);
        let mut receiver = events.subscribe();
        let registry = registry(2, 100).with_events(events);

        registry.record_failure("svc-a");
        registry.record_failure("svc-a");
        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(registry.is_available("svc-a"));

        registry.record_success("svc-a");
        let snapshot = registry.snapshot("svc-a");
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.consecutive_failures, 0);

        assert_eq!(receiver.recv().await.unwrap().event.name(), "circuit-opened");
        assert_eq!(receiver.recv().await.unwrap().event.name(), "circuit-closed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens() {
        let registry = registry(2, 100);
        registry.record_failure("svc-a");
        registry.record_failure("svc-a");
        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(registry.is_available("svc-a"));

        registry.record_failure("svc-a");
        assert_eq!(registry.state("svc-a"), CircuitState::Open);
        assert!(!registry.is_available("svc-a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_event_only_on_transition() {
        let events = EventPublisher::new(8);
        let mut receiver = events.subscribe();
        let registry = registry(1, 60_000).with_events(events);

        registry.record_failure("svc-a");
        registry.record_failure("svc-a");
        registry.record_failure("svc-a");

        assert_eq!(receiver.recv().await.unwrap().event.name(), "circuit-opened");
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_success_resets_failures_without_event_when_closed() {
        let events = EventPublisher::new(8);
        let mut receiver = events.subscribe();
        let registry = registry(5, 1_000).with_events(events);

        registry.record_failure("svc-a");
        registry.record_failure("svc-a");
        registry.record_success("svc-a");

        assert_eq!(registry.snapshot("svc-a").consecutive_failures, 0);
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_available_preserves_order() {
        let registry = registry(1, 1_000);
        registry.record_failure("svc-b");

        let candidates = vec!["svc-a".to_string(), "svc-b".to_string(), "svc-c".to_string()];
        assert_eq!(registry.filter_available(&candidates), vec!["svc-a", "svc-c"]);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(CircuitState::HalfOpen.to_string(), "half-open");
        assert_eq!(
            serde_json::to_string(&CircuitState::HalfOpen).unwrap(),
            "\"half-open\""
        );
    }
}
