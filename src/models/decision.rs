//! # Routing Decision
//!
//! Immutable audit record of one routing choice: what the selector recommended, what
//! survived each filter, which service was picked, and why.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::task::Priority;

/// Score assigned to one candidate during ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceScore {
    pub service_id: String,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub task_id: Uuid,
    pub description: String,
    pub priority: Priority,
    /// Dispatch attempt this decision was made for (1-based)
    pub attempt: u32,
    /// Candidates returned by the service selector
    pub recommended: Vec<String>,
    /// Candidates left after circuit breaker filtering
    pub available: Vec<String>,
    /// Candidates left after health filtering
    pub healthy: Vec<String>,
    pub selected: String,
    /// Per-candidate scores, highest first; empty when ranking was skipped
    pub scores: Vec<ServiceScore>,
    /// Selector reasoning
    pub reasoning: Vec<String>,
    /// Selector resource allocation hint
    pub allocation: Option<Value>,
}
