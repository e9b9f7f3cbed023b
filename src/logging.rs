//! # Structured Logging Module
//!
//! Environment-aware structured logging for the routing engine.
//!
//! - Level: `ROUTING_LOG_LEVEL` (any `EnvFilter` directive), otherwise derived from the
//!   environment (`ROUTING_ENV`, then `APP_ENV`)
//! - Format: human-readable by default, JSON lines with `ROUTING_LOG_FORMAT=json`

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use crate::config::ConfigManager;
use crate::models::RoutingDecision;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let json = wants_json();

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(EnvFilter::new(log_level.clone()))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(EnvFilter::new(log_level.clone()))
                .boxed()
        };

        // A global subscriber may already be installed by the host
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            log_level = %log_level,
            json = json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Current environment from environment variables
pub fn get_environment() -> String {
    ConfigManager::detect_environment()
}

/// Filter directive for the environment, overridable with `ROUTING_LOG_LEVEL`
pub fn get_log_level(environment: &str) -> String {
    if let Ok(level) = std::env::var("ROUTING_LOG_LEVEL") {
        if !level.trim().is_empty() {
            return level;
        }
    }

    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

fn wants_json() -> bool {
    std::env::var("ROUTING_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Log one routing decision
pub fn log_routing_decision(decision: &RoutingDecision) {
    tracing::info!(
        decision_id = %decision.id,
        task_id = %decision.task_id,
        priority = %decision.priority,
        attempt = decision.attempt,
        recommended = ?decision.recommended,
        available = ?decision.available,
        healthy = ?decision.healthy,
        selected = %decision.selected,
        timestamp = %decision.timestamp.to_rfc3339(),
        "🧭 ROUTING_DECISION"
    );
}

/// Log the outcome of one dispatch attempt
pub fn log_task_outcome(
    task_id: Uuid,
    service_id: &str,
    attempt: u32,
    success: bool,
    response_time_ms: u64,
) {
    let status = if success { "succeeded" } else { "failed" };
    tracing::info!(
        task_id = %task_id,
        service_id = %service_id,
        attempt = attempt,
        status = status,
        response_time_ms = response_time_ms,
        timestamp = %Utc::now().to_rfc3339(),
        "📋 TASK_OUTCOME"
    );
}
