//! # Task Model
//!
//! A unit of work submitted for routing.
//!
//! ## Overview
//!
//! A `Task` carries a free-text description used to look up candidate services, a
//! [`Priority`] lane, its own timeout and retry budget, an opaque context bag handed to the
//! service selector, and an optional `tool`/`args` payload handed to the executor.
//!
//! Tasks are built once through the consuming `with_*` methods and are not mutated by the
//! routing engine afterwards, except for the `queued_at` stamp applied when the task is
//! placed on a priority lane.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::config::TaskDefaults;
use crate::constants::defaults;
use crate::error::RouterError;

/// Dispatch priority; each value maps to one FIFO lane
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    /// All lanes in drain order
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            other => Err(RouterError::Validation(format!(
                "Unknown priority '{other}', expected high, normal or low"
            ))),
        }
    }
}

/// A unit of work submitted for routing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    /// Free text used for candidate lookup
    pub description: String,
    pub priority: Priority,
    /// Per-attempt executor timeout
    pub timeout_ms: u64,
    /// Total number of dispatch attempts allowed
    pub max_retries: u32,
    /// Opaque key-value bag passed to the service selector
    #[serde(default)]
    pub context: HashMap<String, Value>,
    pub tool: Option<String>,
    pub args: Option<Value>,
    /// Set when the task is placed on a priority lane
    pub queued_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a task with the built-in defaults (normal priority, 30s timeout, 3 attempts)
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            priority: Priority::default(),
            timeout_ms: defaults::TASK_TIMEOUT_MS,
            max_retries: defaults::TASK_MAX_RETRIES,
            context: HashMap::new(),
            tool: None,
            args: None,
            queued_at: None,
        }
    }

    /// Create a task using configured defaults
    pub fn with_defaults(description: impl Into<String>, task_defaults: &TaskDefaults) -> Self {
        Self::new(description)
            .with_timeout_ms(task_defaults.timeout_ms)
            .with_max_retries(task_defaults.max_retries)
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>, args: Value) -> Self {
        self.tool = Some(tool.into());
        self.args = Some(args);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Number of dispatch attempts; a zero retry budget still dispatches once
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    pub(crate) fn mark_queued(mut self) -> Self {
        self.queued_at = Some(Utc::now());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_defaults() {
        let task = Task::new("scan repository");
        assert_eq!(task.priority, Priority::Normal);
        assert_eq!(task.timeout_ms, 30_000);
        assert_eq!(task.max_retries, 3);
        assert!(task.context.is_empty());
        assert!(task.tool.is_none());
        assert!(task.queued_at.is_none());
    }

    #[test]
    fn test_task_builder() {
        let task = Task::new("deploy worker")
            .with_priority(Priority::High)
            .with_timeout_ms(500)
            .with_max_retries(1)
            .with_context("history", json!(["a", "b"]))
            .with_tool("deploy", json!({"target": "edge"}));

        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.timeout(), Duration::from_millis(500));
        assert_eq!(task.max_attempts(), 1);
        assert_eq!(task.context.get("history"), Some(&json!(["a", "b"])));
        assert_eq!(task.tool.as_deref(), Some("deploy"));
    }

    #[test]
    fn test_zero_retry_budget_still_dispatches_once() {
        let task = Task::new("noop").with_max_retries(0);
        assert_eq!(task.max_attempts(), 1);
    }

    #[test]
    fn test_priority_parsing() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_priority_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        let task: Task = serde_json::from_value(json!({
            "id": Uuid::nil(),
            "description": "from json",
            "priority": "low",
            "timeout_ms": 1000,
            "max_retries": 2,
            "tool": null,
            "args": null,
            "queued_at": null
        }))
        .unwrap();
        assert_eq!(task.priority, Priority::Low);
        assert!(task.context.is_empty());
    }
}
