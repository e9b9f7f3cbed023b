//! # Router
//!
//! Routes one task end to end: candidate lookup, circuit breaker and health filtering,
//! ranking, dispatch with timeout, and bookkeeping of the outcome. Failed attempts are
//! retried with capped exponential backoff unless the failure is terminal.
//!
//! ## Attempt Flow
//!
//! ```text
//! selector ──▶ breakers ──▶ health ──▶ scorer ──▶ decision ──▶ executor (timeout)
//!     ▲                                                            │
//!     └──────────── backoff, re-resolve candidates ◀── retryable ──┤
//!                                                                  ▼
//!                                                  breakers + metrics feedback
//! ```
//!
//! Bookkeeping happens on every outcome before anything is returned. Each attempt
//! re-resolves candidates, so a breaker that opened during the previous attempt removes
//! that service from the next one.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::error_classifier::{ErrorClassifier, ErrorContext};
use super::health::HealthMonitor;
use super::metrics::MetricsStore;
use super::scorer::ServiceScorer;
use super::traits::{Executor, ServiceSelector};
use crate::constants::defaults;
use crate::error::{Result, RouterError};
use crate::logging::{log_routing_decision, log_task_outcome};
use crate::models::{RoutingDecision, Task};
use crate::resilience::CircuitBreakerRegistry;

/// Successful routing outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub success: bool,
    pub service_id: String,
    pub result: Value,
    /// End-to-end time of the routing call, including earlier attempts and backoff waits
    pub response_time_ms: u64,
    /// Executor calls made, including the successful one
    pub attempts: u32,
    pub decision: RoutingDecision,
}

/// Failed routing outcome with the number of executor calls made
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct RouteFailure {
    pub error: RouterError,
    pub attempts: u32,
    /// Service of the last dispatched attempt
    pub last_service_id: Option<String>,
}

/// Collaborators and shared state the router works with
#[derive(Clone)]
pub struct RouterDependencies {
    pub selector: Arc<dyn ServiceSelector>,
    pub executor: Arc<dyn Executor>,
    pub breakers: Arc<CircuitBreakerRegistry>,
    pub health: Arc<HealthMonitor>,
    pub metrics: Arc<MetricsStore>,
    pub scorer: Arc<ServiceScorer>,
    pub classifier: Arc<dyn ErrorClassifier>,
}

pub struct Router {
    deps: RouterDependencies,
    probe_unknown_on_route: bool,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("classifier", &self.deps.classifier.classifier_name())
            .field("probe_unknown_on_route", &self.probe_unknown_on_route)
            .finish()
    }
}

impl Router {
    pub fn new(deps: RouterDependencies, probe_unknown_on_route: bool) -> Self {
        Self {
            deps,
            probe_unknown_on_route,
        }
    }

    pub fn dependencies(&self) -> &RouterDependencies {
        &self.deps
    }

    /// Route a task, surfacing the final error on failure
    pub async fn route_task(&self, task: &Task) -> Result<RouteResult> {
        self.route_task_detailed(task)
            .await
            .map_err(|failure| failure.error)
    }

    /// Route a task, reporting the attempt count on failure
    #[instrument(skip(self, task), fields(task_id = %task.id, priority = %task.priority))]
    pub async fn route_task_detailed(&self, task: &Task) -> std::result::Result<RouteResult, RouteFailure> {
        let started = Instant::now();
        let max_attempts = task.max_attempts();
        self.deps.metrics.record_task_started(task.priority);

        let mut attempts = 0u32;
        let mut last_service_id: Option<String> = None;

        loop {
            let attempt = attempts + 1;

            let decision = match self.decide(task, attempt).await {
                Ok(decision) => decision,
                Err(error) => {
                    warn!(
                        task_id = %task.id,
                        attempt = attempt,
                        error = %error,
                        "No service available for task"
                    );
                    return Err(self.fail(task, error, attempts, last_service_id));
                }
            };

            log_routing_decision(&decision);
            self.deps.metrics.record_decision(decision.clone());

            let service_id = decision.selected.clone();
            attempts = attempt;
            last_service_id = Some(service_id.clone());

            let call_started = Instant::now();
            let outcome = self.dispatch(task, &service_id).await;
            let response_time_ms = call_started.elapsed().as_millis() as u64;

            match outcome {
                Ok(result) => {
                    self.deps.breakers.record_success(&service_id);
                    self.deps
                        .metrics
                        .record_outcome(&service_id, true, response_time_ms);
                    let total_time_ms = started.elapsed().as_millis() as u64;
                    self.deps
                        .metrics
                        .record_task_completed(task.priority, total_time_ms);
                    log_task_outcome(task.id, &service_id, attempt, true, response_time_ms);

                    return Ok(RouteResult {
                        success: true,
                        service_id,
                        result,
                        response_time_ms: total_time_ms,
                        attempts,
                        decision,
                    });
                }
                Err(error) => {
                    self.deps.breakers.record_failure(&service_id);
                    self.deps
                        .metrics
                        .record_outcome(&service_id, false, response_time_ms);
                    log_task_outcome(task.id, &service_id, attempt, false, response_time_ms);

                    let classification = self.deps.classifier.classify_error(
                        &error,
                        &ErrorContext {
                            service_id: Some(&service_id),
                            attempt_number: attempt,
                            max_attempts,
                        },
                    );

                    match classification.retry_delay {
                        Some(delay) if classification.is_retryable => {
                            warn!(
                                task_id = %task.id,
                                service_id = %service_id,
                                attempt = attempt,
                                max_attempts = max_attempts,
                                category = %classification.error_category,
                                retry_in_ms = delay.as_millis() as u64,
                                error = %error,
                                "🔄 Attempt failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        _ => {
                            warn!(
                                task_id = %task.id,
                                service_id = %service_id,
                                attempt = attempt,
                                category = %classification.error_category,
                                final_attempt = classification.is_final_attempt,
                                error = %error,
                                "❌ Task failed"
                            );
                            return Err(self.fail(task, error, attempts, last_service_id));
                        }
                    }
                }
            }
        }
    }

    /// Resolve, filter and rank candidates for one attempt
    async fn decide(&self, task: &Task, attempt: u32) -> Result<RoutingDecision> {
        let recommendation = self
            .deps
            .selector
            .recommend(&task.description, &task.context);

        let available = self.deps.breakers.filter_available(&recommendation.services);

        if self.probe_unknown_on_route {
            self.deps.health.check_unknown(&available).await;
        }
        let healthy = self.deps.health.filter_healthy(&available);

        let ranking = self.deps.scorer.rank(&healthy, task.priority);
        let Some(selected) = ranking.top().map(str::to_string) else {
            return Err(RouterError::NoAvailableService {
                description: task.description.clone(),
            });
        };

        debug!(
            task_id = %task.id,
            recommended = recommendation.services.len(),
            available = available.len(),
            healthy = healthy.len(),
            selected = %selected,
            "Candidates resolved"
        );

        Ok(RoutingDecision {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            task_id: task.id,
            description: task.description.clone(),
            priority: task.priority,
            attempt,
            recommended: recommendation.services,
            available,
            healthy,
            selected,
            scores: ranking.scores,
            reasoning: recommendation.reasoning,
            allocation: recommendation.allocation,
        })
    }

    /// Invoke the executor, racing it against the task timeout.
    ///
    /// On timeout the executor future is dropped, which cancels it at its next await point.
    async fn dispatch(&self, task: &Task, service_id: &str) -> Result<Value> {
        let tool = task.tool.as_deref().unwrap_or(defaults::EXECUTOR_TOOL);
        let args = task.args.clone().unwrap_or_else(|| json!({}));

        match tokio::time::timeout(
            task.timeout(),
            self.deps.executor.invoke(service_id, tool, &args),
        )
        .await
        {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(error)) => Err(error.into()),
            Err(_) => Err(RouterError::Timeout {
                service_id: service_id.to_string(),
                timeout_ms: task.timeout_ms,
            }),
        }
    }

    fn fail(
        &self,
        task: &Task,
        error: RouterError,
        attempts: u32,
        last_service_id: Option<String>,
    ) -> RouteFailure {
        self.deps.metrics.record_task_failed(task.priority);
        RouteFailure {
            error,
            attempts,
            last_service_id,
        }
    }
}
