//! # Routing Core
//!
//! Process-level assembly of the routing engine. [`RoutingCore`] owns the circuit breaker
//! registry, health monitor, metrics store, priority queues and router, and runs two
//! independent background loops once started:
//!
//! - **Health loop**: every `health.check_interval_ms`, probes every service the selector
//!   knows about plus every service seen before
//! - **Queue loop**: every `queue.tick_interval_ms`, drains the priority lanes
//!
//! ## Usage
//!
//! ```rust,no_run
//! use routing_core::config::RouterConfig;
//! use routing_core::models::{Priority, Task};
//! use routing_core::routing::{RoutingCore, StaticServiceSelector};
//! # use routing_core::routing::{Executor, HealthProbe};
//! # use std::sync::Arc;
//! # async fn example(executor: Arc<dyn Executor>, probe: Arc<dyn HealthProbe>) -> routing_core::Result<()> {
//!
//! let core = RoutingCore::builder(RouterConfig::default())
//!     .selector(Arc::new(StaticServiceSelector::new(["svc-a", "svc-b"])))
//!     .executor(executor)
//!     .probe(probe)
//!     .build()?;
//!
//! core.start()?;
//! core.queue_task(Task::new("nightly report").with_priority(Priority::Low));
//! let result = core.route_task(&Task::new("resize image")).await?;
//! println!("routed to {}", result.service_id);
//! core.stop().await;
//! # Ok(())
//! # }
//! ```

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};
use uuid::Uuid;

use super::error_classifier::{ErrorClassifier, StandardErrorClassifier};
use super::health::{HealthMonitor, HealthRecord};
use super::metrics::{MetricsStore, RoutingAnalytics};
use super::processor::{DrainReport, QueueProcessor};
use super::queue::{PriorityQueues, QueueSizes};
use super::router::{RouteFailure, RouteResult, Router, RouterDependencies};
use super::scorer::ServiceScorer;
use super::traits::{Executor, HealthProbe, LoadSource, NoLoad, ServiceSelector};
use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use crate::events::{EventPublisher, PublishedEvent, RoutingEvent};
use crate::models::{RoutingDecision, Task};
use crate::resilience::CircuitBreakerRegistry;

struct Lifecycle {
    shutdown_tx: broadcast::Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

pub struct RoutingCore {
    config: RouterConfig,
    selector: Arc<dyn ServiceSelector>,
    router: Arc<Router>,
    queues: Arc<PriorityQueues>,
    processor: QueueProcessor,
    events: EventPublisher,
    lifecycle: Mutex<Option<Lifecycle>>,
}

impl std::fmt::Debug for RoutingCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingCore")
            .field("router", &self.router)
            .field("queue_sizes", &self.queues.sizes())
            .field("running", &self.is_running())
            .finish()
    }
}

impl RoutingCore {
    pub fn builder(config: RouterConfig) -> RoutingCoreBuilder {
        RoutingCoreBuilder::new(config)
    }

    /// Spawn the health and queue loops; must be called from within a Tokio runtime
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.is_some() {
            return Err(RouterError::InvalidState(
                "routing core is already running".to_string(),
            ));
        }

        let (shutdown_tx, _) = broadcast::channel(1);
        let mut handles = Vec::with_capacity(2);

        info!(
            health_interval_ms = self.config.health.check_interval_ms,
            queue_tick_ms = self.config.queue.tick_interval_ms,
            "🚀 ROUTING_CORE: Starting background loops"
        );

        // Health monitor loop
        {
            let selector = self.selector.clone();
            let health = self.router.dependencies().health.clone();
            let mut shutdown_rx = shutdown_tx.subscribe();
            let period = self.config.health.check_interval();

            handles.push(tokio::spawn(async move {
                let mut ticker = loop_interval(period);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            let services = monitored_services(selector.as_ref(), &health);
                            debug!(services = services.len(), "Running health checks");
                            health.check_all(&services).await;
                        }
                        _ = shutdown_rx.recv() => {
                            info!("🛑 ROUTING_CORE: Health loop shutting down");
                            break;
                        }
                    }
                }
            }));
        }

        // Queue processor loop
        {
            let processor = self.processor.clone();
            let mut shutdown_rx = shutdown_tx.subscribe();
            let period = self.config.queue.tick_interval();

            handles.push(tokio::spawn(async move {
                let mut ticker = loop_interval(period);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            processor.drain_once().await;
                        }
                        _ = shutdown_rx.recv() => {
                            info!("🛑 ROUTING_CORE: Queue loop shutting down");
                            break;
                        }
                    }
                }
            }));
        }

        *lifecycle = Some(Lifecycle {
            shutdown_tx,
            handles,
        });
        Ok(())
    }

    /// Signal both loops and wait for them to exit; a no-op when not running.
    ///
    /// A drain already in progress finishes before the queue loop exits.
    pub async fn stop(&self) {
        let Some(lifecycle) = self.lifecycle.lock().take() else {
            debug!("Routing core is not running");
            return;
        };

        let _ = lifecycle.shutdown_tx.send(());
        for handle in lifecycle.handles {
            if let Err(join_error) = handle.await {
                error!(error = %join_error, "Background loop terminated abnormally");
            }
        }

        info!("✅ ROUTING_CORE: Stopped");
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.lock().is_some()
    }

    /// Enqueue a task on its priority lane; it is routed by the queue loop
    pub fn queue_task(&self, task: Task) -> Uuid {
        let task = task.mark_queued();
        let task_id = task.id;
        let priority = task.priority;
        let queue_size = self.queues.enqueue(task);

        debug!(task_id = %task_id, priority = %priority, queue_size = queue_size, "📥 Task queued");
        self.events.publish(RoutingEvent::TaskQueued {
            task_id,
            priority,
            queue_size,
        });

        task_id
    }

    pub async fn route_task(&self, task: &Task) -> Result<RouteResult> {
        self.router.route_task(task).await
    }

    pub async fn route_task_detailed(
        &self,
        task: &Task,
    ) -> std::result::Result<RouteResult, RouteFailure> {
        self.router.route_task_detailed(task).await
    }

    /// Run one drain pass immediately
    pub async fn drain_queues(&self) -> DrainReport {
        self.processor.drain_once().await
    }

    /// Probe every monitored service immediately
    pub async fn run_health_checks(&self) -> Vec<(String, HealthRecord)> {
        let health = &self.router.dependencies().health;
        let services = monitored_services(self.selector.as_ref(), health);
        health.check_all(&services).await
    }

    pub fn get_analytics(&self) -> RoutingAnalytics {
        let deps = self.router.dependencies();
        RoutingAnalytics {
            overview: deps.metrics.overview(),
            by_priority: deps.metrics.by_priority(),
            by_service: deps.metrics.by_service(),
            circuit_breakers: deps.breakers.snapshot_all(),
            service_health: deps.health.snapshot(),
            queue_sizes: self.queues.sizes(),
        }
    }

    /// The last `limit` routing decisions, oldest first
    pub fn get_recent_decisions(&self, limit: usize) -> Vec<RoutingDecision> {
        self.router.dependencies().metrics.recent_decisions(limit)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.events.subscribe()
    }

    pub fn queue_sizes(&self) -> QueueSizes {
        self.queues.sizes()
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn circuit_breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.router.dependencies().breakers
    }

    pub fn health_monitor(&self) -> &Arc<HealthMonitor> {
        &self.router.dependencies().health
    }

    pub fn metrics(&self) -> &Arc<MetricsStore> {
        &self.router.dependencies().metrics
    }
}

impl Drop for RoutingCore {
    fn drop(&mut self) {
        if let Some(lifecycle) = self.lifecycle.get_mut().take() {
            let _ = lifecycle.shutdown_tx.send(());
        }
    }
}

/// First tick one period after start, then every period; late ticks are delayed, not bunched
fn loop_interval(period: Duration) -> tokio::time::Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn monitored_services(selector: &dyn ServiceSelector, health: &HealthMonitor) -> Vec<String> {
    let mut services = selector.known_services();
    for service_id in health.tracked_services() {
        if !services.contains(&service_id) {
            services.push(service_id);
        }
    }
    services
}

pub struct RoutingCoreBuilder {
    config: RouterConfig,
    selector: Option<Arc<dyn ServiceSelector>>,
    executor: Option<Arc<dyn Executor>>,
    probe: Option<Arc<dyn HealthProbe>>,
    load: Arc<dyn LoadSource>,
    classifier: Option<Arc<dyn ErrorClassifier>>,
    events: Option<EventPublisher>,
}

impl RoutingCoreBuilder {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            selector: None,
            executor: None,
            probe: None,
            load: Arc::new(NoLoad),
            classifier: None,
            events: None,
        }
    }

    pub fn selector(mut self, selector: Arc<dyn ServiceSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn load_source(mut self, load: Arc<dyn LoadSource>) -> Self {
        self.load = load;
        self
    }

    /// Replace the standard classifier built from the retry settings
    pub fn classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Publish notifications on an existing publisher instead of a new one
    pub fn events(mut self, events: EventPublisher) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<RoutingCore> {
        self.config.validate()?;

        let selector = self
            .selector
            .ok_or_else(|| RouterError::Configuration("a service selector is required".to_string()))?;
        let executor = self
            .executor
            .ok_or_else(|| RouterError::Configuration("an executor is required".to_string()))?;
        let probe = self
            .probe
            .ok_or_else(|| RouterError::Configuration("a health probe is required".to_string()))?;

        let config = self.config;
        let events = self
            .events
            .unwrap_or_else(|| EventPublisher::new(config.events.channel_capacity));

        let breakers = Arc::new(
            CircuitBreakerRegistry::new(config.circuit_breaker_config()).with_events(events.clone()),
        );
        let health = Arc::new(HealthMonitor::new(probe, config.health.probe_timeout()));
        let metrics = Arc::new(MetricsStore::new(config.history.capacity));
        let scorer = Arc::new(ServiceScorer::new(
            metrics.clone(),
            self.load,
            config.scoring.priority_capable_services.iter().cloned(),
        ));
        let classifier = self
            .classifier
            .unwrap_or_else(|| Arc::new(StandardErrorClassifier::new(config.backoff_policy())));

        let router = Arc::new(Router::new(
            RouterDependencies {
                selector: selector.clone(),
                executor,
                breakers,
                health,
                metrics,
                scorer,
                classifier,
            },
            config.health.probe_unknown_on_route,
        ));
        let queues = Arc::new(PriorityQueues::new());
        let processor = QueueProcessor::new(queues.clone(), router.clone());

        debug!(
            failure_threshold = config.circuit_breaker.failure_threshold,
            history_capacity = config.history.capacity,
            priority_capable = config.scoring.priority_capable_services.len(),
            "Routing core assembled"
        );

        Ok(RoutingCore {
            config,
            selector,
            router,
            queues,
            processor,
            events,
            lifecycle: Mutex::new(None),
        })
    }
}
