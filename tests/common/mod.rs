#![allow(dead_code)]

pub mod mocks;
pub mod strategies;

pub use mocks::*;

use routing_core::config::RouterConfig;
use routing_core::routing::{RoutingCore, ServiceSelector, StaticServiceSelector};
use std::sync::Arc;

/// Configuration with short timers and the documented breaker/retry behavior
pub fn test_config() -> RouterConfig {
    let mut config = RouterConfig::default();
    config.health.check_interval_ms = 1_000;
    config.health.probe_timeout_ms = 100;
    config.queue.tick_interval_ms = 1_000;
    config
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Assemble a core over a fixed candidate list
pub fn build_core(
    config: RouterConfig,
    services: &[&str],
    executor: Arc<ScriptedExecutor>,
    probe: Arc<RecordingProbe>,
) -> RoutingCore {
    build_core_with_selector(
        config,
        Arc::new(StaticServiceSelector::new(services.iter().copied())),
        executor,
        probe,
    )
}

pub fn build_core_with_selector(
    config: RouterConfig,
    selector: Arc<dyn ServiceSelector>,
    executor: Arc<ScriptedExecutor>,
    probe: Arc<RecordingProbe>,
) -> RoutingCore {
    RoutingCore::builder(config)
        .selector(selector)
        .executor(executor)
        .probe(probe)
        .build()
        .expect("test configuration is valid")
}
