//! # Adaptive Task Routing
//!
//! Selects a downstream service for every task, protects services from repeated calls while
//! they fail, and adapts choices to observed health and performance.
//!
//! ## Components
//!
//! - [`traits`]: collaborators supplied by the host (selector, executor, probe, load)
//! - [`health`]: cached health verdicts refreshed by probing
//! - [`scorer`]: ranks candidates from metrics and load
//! - [`metrics`]: outcome counters and decision history
//! - [`queue`] / [`processor`]: priority lanes and their strict-order drain
//! - [`router`]: per-task orchestration with timeout and retry
//! - [`core`]: assembly, background loops and the host-facing API

pub mod core;
pub mod error_classifier;
pub mod health;
pub mod metrics;
pub mod processor;
pub mod queue;
pub mod router;
pub mod scorer;
pub mod selector;
pub mod traits;

pub use self::core::{RoutingCore, RoutingCoreBuilder};
pub use error_classifier::{
    ErrorCategory, ErrorClassification, ErrorClassifier, ErrorContext, StandardErrorClassifier,
};
pub use health::{HealthMonitor, HealthRecord};
pub use metrics::{
    MetricsStore, OverviewStats, PriorityAnalytics, PriorityCounts, RoutingAnalytics,
    ServiceAnalytics, ServiceStats,
};
pub use processor::{DrainReport, QueueProcessor};
pub use queue::{PriorityQueues, QueueSizes};
pub use router::{RouteFailure, RouteResult, Router, RouterDependencies};
pub use scorer::{compute_score, Ranking, ServiceScorer};
pub use selector::{KeywordServiceSelector, StaticServiceSelector};
pub use traits::{Executor, HealthProbe, LoadSource, NoLoad, Recommendation, ServiceSelector};
