//! # Resilience Module
//!
//! Fault isolation for downstream services.
//!
//! ## Architecture
//!
//! - **Circuit Breaker Registry**: per-service closed/open/half-open state machine that
//!   removes failing services from routing until their open window elapses
//! - **Backoff**: capped exponential delay schedule between retry attempts
//!
//! ## Usage
//!
//! ```rust
//! use routing_core::resilience::{CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState};
//! use std::time::Duration;
//!
//! let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig {
//!     failure_threshold: 2,
//!     timeout: Duration::from_secs(30),
//! });
//!
//! registry.record_failure("svc-a");
//! registry.record_failure("svc-a");
//! assert_eq!(registry.state("svc-a"), CircuitState::Open);
//! ```

pub mod backoff;
pub mod circuit_breaker;

pub use backoff::BackoffPolicy;
pub use circuit_breaker::{
    CircuitBreakerConfig, CircuitBreakerRegistry, CircuitBreakerState, CircuitState,
};
