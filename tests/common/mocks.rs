//! Test doubles for the routing engine's external collaborators.

use async_trait::async_trait;
use parking_lot::Mutex;
use routing_core::error::ExecutorError;
use routing_core::routing::{Executor, HealthProbe, LoadSource};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

/// One scripted executor response
#[derive(Debug, Clone)]
pub struct Step {
    pub delay: Duration,
    pub result: Result<Value, ExecutorError>,
}

impl Step {
    pub fn ok() -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(json!({"status": "ok"})),
        }
    }

    pub fn fail(error: ExecutorError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }

    pub fn transient() -> Self {
        Self::fail(ExecutorError::transient("connection reset"))
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            result: Ok(json!({"status": "slow"})),
        }
    }
}

/// Executor call as observed by the mock
#[derive(Debug, Clone)]
pub struct Call {
    pub service_id: String,
    pub tool: String,
    pub args: Value,
    pub at: Instant,
}

/// Executor answering from per-service scripts, falling back to a default step
#[derive(Debug)]
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    default_step: Step,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedExecutor {
    pub fn succeeding() -> Self {
        Self::with_default(Step::ok())
    }

    pub fn failing(error: ExecutorError) -> Self {
        Self::with_default(Step::fail(error))
    }

    pub fn with_default(default_step: Step) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default_step,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue steps for a service, consumed before the default applies
    pub fn script(self, service_id: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .entry(service_id.to_string())
            .or_default()
            .extend(steps);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn services_called(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|call| call.service_id.clone())
            .collect()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn invoke(
        &self,
        service_id: &str,
        tool: &str,
        args: &Value,
    ) -> Result<Value, ExecutorError> {
        self.calls.lock().push(Call {
            service_id: service_id.to_string(),
            tool: tool.to_string(),
            args: args.clone(),
            at: Instant::now(),
        });

        let step = self
            .scripts
            .lock()
            .get_mut(service_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.default_step.clone());

        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.result
    }
}

/// Probe reporting a configurable healthy set and counting probes per service
#[derive(Debug, Default)]
pub struct RecordingProbe {
    unhealthy: Mutex<HashSet<String>>,
    probes: Mutex<HashMap<String, usize>>,
}

impl RecordingProbe {
    pub fn all_healthy() -> Self {
        Self::default()
    }

    pub fn with_unhealthy(services: &[&str]) -> Self {
        let probe = Self::default();
        for service_id in services {
            probe.set_healthy(service_id, false);
        }
        probe
    }

    pub fn set_healthy(&self, service_id: &str, healthy: bool) {
        let mut unhealthy = self.unhealthy.lock();
        if healthy {
            unhealthy.remove(service_id);
        } else {
            unhealthy.insert(service_id.to_string());
        }
    }

    pub fn probe_count(&self, service_id: &str) -> usize {
        self.probes.lock().get(service_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl HealthProbe for RecordingProbe {
    async fn probe(&self, service_id: &str) -> Result<(), ExecutorError> {
        *self.probes.lock().entry(service_id.to_string()).or_default() += 1;

        if self.unhealthy.lock().contains(service_id) {
            Err(ExecutorError::transient("capability listing failed"))
        } else {
            Ok(())
        }
    }
}

/// Load source with fixed per-service values
#[derive(Debug, Default)]
pub struct FixedLoad(pub HashMap<String, f64>);

impl LoadSource for FixedLoad {
    fn load(&self, service_id: &str) -> Option<f64> {
        self.0.get(service_id).copied()
    }
}
