#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Routing Core
//!
//! Adaptive task routing engine: accepts tasks, picks the downstream service that should
//! run each one, isolates failing services behind circuit breakers, and adapts its choices
//! to observed health and performance.
//!
//! ## Overview
//!
//! Every task flows through the same pipeline:
//!
//! 1. The host's [`ServiceSelector`](routing::ServiceSelector) proposes candidate services
//! 2. Services whose circuit breaker is open are removed
//! 3. Services the health monitor considers unhealthy are removed (unless that would remove
//!    all of them)
//! 4. Survivors are scored from response time, load and success rate; the best one wins
//! 5. The host's [`Executor`](routing::Executor) runs the task with a timeout; transient
//!    failures are retried with capped exponential backoff
//!
//! Tasks can be routed directly or queued on one of three priority lanes that a background
//! loop drains in strict high → normal → low order.
//!
//! ## Module Organization
//!
//! - [`routing`] - Router, scorer, health monitor, metrics, queues and the [`RoutingCore`] facade
//! - [`resilience`] - Circuit breaker registry and backoff schedule
//! - [`models`] - Tasks and routing decisions
//! - [`events`] - `circuit-opened`, `circuit-closed` and `task-queued` notifications
//! - [`config`] - Typed configuration and the layered loader
//! - [`error`] - Error taxonomy
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use routing_core::error::ExecutorError;
//! use routing_core::routing::{Executor, HealthProbe, KeywordServiceSelector};
//! use routing_core::{RouterConfig, RoutingCore, Task};
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! struct EchoExecutor;
//!
//! #[async_trait]
//! impl Executor for EchoExecutor {
//!     async fn invoke(&self, service_id: &str, tool: &str, args: &Value) -> Result<Value, ExecutorError> {
//!         Ok(json!({ "service": service_id, "tool": tool, "args": args }))
//!     }
//! }
//!
//! struct AlwaysUp;
//!
//! #[async_trait]
//! impl HealthProbe for AlwaysUp {
//!     async fn probe(&self, _service_id: &str) -> Result<(), ExecutorError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> routing_core::Result<()> {
//! routing_core::logging::init_structured_logging();
//!
//! let selector = KeywordServiceSelector::new()
//!     .rule(["file", "read"], "filesystem", "file operations")
//!     .rule(["commit", "branch"], "git", "version control")
//!     .fallback(["filesystem"]);
//!
//! let core = RoutingCore::builder(RouterConfig::default())
//!     .selector(Arc::new(selector))
//!     .executor(Arc::new(EchoExecutor))
//!     .probe(Arc::new(AlwaysUp))
//!     .build()?;
//!
//! core.start()?;
//! let result = core.route_task(&Task::new("read the changelog file")).await?;
//! assert_eq!(result.service_id, "filesystem");
//! core.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod resilience;
pub mod routing;

pub use crate::config::{ConfigManager, RouterConfig};
pub use crate::error::{ErrorCode, ExecutorError, Result, RouterError};
pub use crate::events::{EventPublisher, PublishedEvent, RoutingEvent};
pub use crate::models::{Priority, RoutingDecision, Task};
pub use crate::resilience::{CircuitBreakerRegistry, CircuitState};
pub use crate::routing::{RouteFailure, RouteResult, RoutingAnalytics, RoutingCore};
