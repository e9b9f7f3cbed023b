//! # Routing Metrics
//!
//! Per-service and per-priority counters, task-level overview statistics, and a bounded
//! ring buffer of recent [`RoutingDecision`]s.
//!
//! All state sits behind one `parking_lot::Mutex`; every update is a single lock-scoped
//! read-modify-write and the lock is never held across an `.await`.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

use super::health::HealthRecord;
use super::queue::QueueSizes;
use crate::models::{Priority, RoutingDecision};
use crate::resilience::CircuitBreakerState;

/// Cumulative outcome counters for one service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    /// Sum over successful calls only
    pub total_response_time_ms: u64,
}

impl ServiceStats {
    /// Fraction of successful calls; 1.0 for a service with no history
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.successful as f64 / self.total as f64
        }
    }

    /// Mean response time of successful calls
    pub fn avg_response_time_ms(&self) -> Option<f64> {
        (self.successful > 0).then(|| self.total_response_time_ms as f64 / self.successful as f64)
    }

    fn record(&mut self, success: bool, response_time_ms: u64) {
        self.total += 1;
        if success {
            self.successful += 1;
            self.total_response_time_ms = self.total_response_time_ms.saturating_add(response_time_ms);
        } else {
            self.failed += 1;
        }
    }
}

/// Task counters for one priority lane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
}

impl PriorityCounts {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Task-level totals across all priorities
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewStats {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    /// `completed / total`, 0 when no task has been routed
    pub success_rate: f64,
    /// Running mean of end-to-end routing time for completed tasks
    pub avg_response_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAnalytics {
    #[serde(flatten)]
    pub stats: ServiceStats,
    pub success_rate: f64,
    pub avg_response_time_ms: Option<f64>,
}

impl From<ServiceStats> for ServiceAnalytics {
    fn from(stats: ServiceStats) -> Self {
        Self {
            stats,
            success_rate: stats.success_rate(),
            avg_response_time_ms: stats.avg_response_time_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityAnalytics {
    #[serde(flatten)]
    pub counts: PriorityCounts,
    pub success_rate: f64,
}

/// Point-in-time view of everything the engine tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingAnalytics {
    pub overview: OverviewStats,
    pub by_priority: BTreeMap<Priority, PriorityAnalytics>,
    pub by_service: BTreeMap<String, ServiceAnalytics>,
    pub circuit_breakers: BTreeMap<String, CircuitBreakerState>,
    pub service_health: BTreeMap<String, HealthRecord>,
    pub queue_sizes: QueueSizes,
}

#[derive(Debug)]
struct MetricsInner {
    services: HashMap<String, ServiceStats>,
    priorities: HashMap<Priority, PriorityCounts>,
    overview: OverviewStats,
    decisions: VecDeque<RoutingDecision>,
}

#[derive(Debug)]
pub struct MetricsStore {
    capacity: usize,
    inner: Mutex<MetricsInner>,
}

impl MetricsStore {
    pub fn new(decision_capacity: usize) -> Self {
        let capacity = decision_capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(MetricsInner {
                services: HashMap::new(),
                priorities: HashMap::new(),
                overview: OverviewStats::default(),
                decisions: VecDeque::with_capacity(capacity),
            }),
        }
    }

    /// Record the outcome of one executor call
    pub fn record_outcome(&self, service_id: &str, success: bool, response_time_ms: u64) {
        let mut inner = self.inner.lock();
        inner
            .services
            .entry(service_id.to_string())
            .or_default()
            .record(success, response_time_ms);
    }

    /// Count a task entering the router
    pub fn record_task_started(&self, priority: Priority) {
        let mut inner = self.inner.lock();
        inner.priorities.entry(priority).or_default().total += 1;
        inner.overview.total_tasks += 1;
        Self::refresh_success_rate(&mut inner.overview);
    }

    pub fn record_task_completed(&self, priority: Priority, response_time_ms: u64) {
        let mut inner = self.inner.lock();
        inner.priorities.entry(priority).or_default().completed += 1;

        let overview = &mut inner.overview;
        overview.completed_tasks += 1;
        overview.avg_response_time_ms +=
            (response_time_ms as f64 - overview.avg_response_time_ms) / overview.completed_tasks as f64;
        Self::refresh_success_rate(overview);
    }

    pub fn record_task_failed(&self, priority: Priority) {
        let mut inner = self.inner.lock();
        inner.priorities.entry(priority).or_default().failed += 1;
        inner.overview.failed_tasks += 1;
        Self::refresh_success_rate(&mut inner.overview);
    }

    /// Append a decision, evicting the oldest once the buffer is full
    pub fn record_decision(&self, decision: RoutingDecision) {
        let mut inner = self.inner.lock();
        while inner.decisions.len() >= self.capacity {
            inner.decisions.pop_front();
        }
        inner.decisions.push_back(decision);
    }

    /// The last `limit` decisions, oldest first
    pub fn recent_decisions(&self, limit: usize) -> Vec<RoutingDecision> {
        let inner = self.inner.lock();
        let skip = inner.decisions.len().saturating_sub(limit);
        inner.decisions.iter().skip(skip).cloned().collect()
    }

    pub fn decision_count(&self) -> usize {
        self.inner.lock().decisions.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn service_stats(&self, service_id: &str) -> ServiceStats {
        self.inner
            .lock()
            .services
            .get(service_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn overview(&self) -> OverviewStats {
        self.inner.lock().overview
    }

    pub fn priority_counts(&self, priority: Priority) -> PriorityCounts {
        self.inner
            .lock()
            .priorities
            .get(&priority)
            .copied()
            .unwrap_or_default()
    }

    pub fn by_priority(&self) -> BTreeMap<Priority, PriorityAnalytics> {
        let inner = self.inner.lock();
        Priority::ALL
            .iter()
            .map(|priority| {
                let counts = inner.priorities.get(priority).copied().unwrap_or_default();
                (
                    *priority,
                    PriorityAnalytics {
                        counts,
                        success_rate: counts.success_rate(),
                    },
                )
            })
            .collect()
    }

    pub fn by_service(&self) -> BTreeMap<String, ServiceAnalytics> {
        self.inner
            .lock()
            .services
            .iter()
            .map(|(service_id, stats)| (service_id.clone(), ServiceAnalytics::from(*stats)))
            .collect()
    }

    fn refresh_success_rate(overview: &mut OverviewStats) {
        overview.success_rate = if overview.total_tasks == 0 {
            0.0
        } else {
            overview.completed_tasks as f64 / overview.total_tasks as f64
        };
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new(crate::constants::defaults::DECISION_HISTORY_CAPACITY)
    }
}
