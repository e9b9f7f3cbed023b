//! # External Collaborators
//!
//! Seams the host application plugs into the routing engine: the service catalog
//! ([`ServiceSelector`]), the transport that runs work ([`Executor`]), the cheap capability
//! check used by health monitoring ([`HealthProbe`]) and an optional load signal
//! ([`LoadSource`]).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ExecutorError;

/// Candidate services for a task, as returned by a [`ServiceSelector`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Candidate service ids, possibly ranked
    pub services: Vec<String>,
    pub reasoning: Vec<String>,
    /// Opaque resource allocation hint recorded on the routing decision
    pub allocation: Option<Value>,
}

impl Recommendation {
    pub fn new(services: Vec<String>) -> Self {
        Self {
            services,
            ..Default::default()
        }
    }

    pub fn with_reasoning(mut self, reason: impl Into<String>) -> Self {
        self.reasoning.push(reason.into());
        self
    }

    pub fn with_allocation(mut self, allocation: Value) -> Self {
        self.allocation = Some(allocation);
        self
    }
}

/// Maps task descriptions to candidate services; read-only
pub trait ServiceSelector: Send + Sync {
    fn recommend(&self, description: &str, context: &HashMap<String, Value>) -> Recommendation;

    /// Every service the catalog knows about, probed by the health monitor loop
    fn known_services(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Invokes a service and returns its result
#[async_trait]
pub trait Executor: Send + Sync {
    async fn invoke(
        &self,
        service_id: &str,
        tool: &str,
        args: &Value,
    ) -> Result<Value, ExecutorError>;
}

/// Lightweight capability check for one service
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, service_id: &str) -> Result<(), ExecutorError>;
}

/// Current load of a service in `[0, 1]`; `None` when unknown
pub trait LoadSource: Send + Sync {
    fn load(&self, service_id: &str) -> Option<f64>;
}

/// Load source reporting no load for every service
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLoad;

impl LoadSource for NoLoad {
    fn load(&self, _service_id: &str) -> Option<f64> {
        None
    }
}
