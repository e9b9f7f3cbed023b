//! # Routing Constants
//!
//! Event names, default tunables and scoring weights shared across the routing engine.

/// Notification names emitted by the engine
pub mod events {
    pub const CIRCUIT_OPENED: &str = "circuit-opened";
    pub const CIRCUIT_CLOSED: &str = "circuit-closed";
    pub const TASK_QUEUED: &str = "task-queued";
}

/// Defaults used when no configuration overrides them
pub mod defaults {
    pub const CIRCUIT_BREAKER_THRESHOLD: u32 = 5;
    pub const CIRCUIT_BREAKER_TIMEOUT_MS: u64 = 60_000;
    pub const HEALTH_CHECK_INTERVAL_MS: u64 = 30_000;
    pub const HEALTH_PROBE_TIMEOUT_MS: u64 = 5_000;
    pub const QUEUE_TICK_INTERVAL_MS: u64 = 1_000;
    pub const DECISION_HISTORY_CAPACITY: usize = 1_000;
    pub const RETRY_BASE_DELAY_MS: u64 = 1_000;
    pub const RETRY_MAX_DELAY_MS: u64 = 10_000;
    pub const TASK_TIMEOUT_MS: u64 = 30_000;
    pub const TASK_MAX_RETRIES: u32 = 3;
    pub const EVENT_CHANNEL_CAPACITY: usize = 1_000;

    /// Tool invoked when a task does not name one
    pub const EXECUTOR_TOOL: &str = "execute";
}

/// Score weights applied by the service scorer
pub mod scoring {
    pub const BASE_SCORE: i32 = 100;

    pub const SLOW_RESPONSE_MS: f64 = 5_000.0;
    pub const SLOW_RESPONSE_PENALTY: i32 = 30;
    pub const ELEVATED_RESPONSE_MS: f64 = 2_000.0;
    pub const ELEVATED_RESPONSE_PENALTY: i32 = 15;

    pub const HIGH_LOAD: f64 = 0.8;
    pub const HIGH_LOAD_PENALTY: i32 = 25;
    pub const MODERATE_LOAD: f64 = 0.5;
    pub const MODERATE_LOAD_PENALTY: i32 = 10;

    pub const LOW_SUCCESS_RATE: f64 = 0.90;
    pub const LOW_SUCCESS_PENALTY: i32 = 20;
    pub const REDUCED_SUCCESS_RATE: f64 = 0.95;
    pub const REDUCED_SUCCESS_PENALTY: i32 = 10;

    pub const PRIORITY_CAPABLE_BONUS: i32 = 15;
}
