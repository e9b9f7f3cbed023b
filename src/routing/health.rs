//! # Service Health Monitoring
//!
//! Caches a boolean health verdict per service, refreshed by probing. Health data is
//! advisory: [`HealthMonitor::filter_healthy`] never returns an empty set when it was given
//! candidates, so an outage of the probe itself cannot starve routing.
//!
//! Probes run outside any lock; each cache write is a single insert once the probe settles.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::traits::HealthProbe;

/// Last observed health of one service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub healthy: bool,
    pub last_checked_at: DateTime<Utc>,
    /// Probe latency, recorded for successful probes
    pub response_time_ms: Option<u64>,
    pub error: Option<String>,
}

pub struct HealthMonitor {
    probe: Arc<dyn HealthProbe>,
    probe_timeout: Duration,
    records: DashMap<String, HealthRecord>,
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("probe_timeout", &self.probe_timeout)
            .field("tracked_services", &self.records.len())
            .finish()
    }
}

impl HealthMonitor {
    pub fn new(probe: Arc<dyn HealthProbe>, probe_timeout: Duration) -> Self {
        Self {
            probe,
            probe_timeout,
            records: DashMap::new(),
        }
    }

    /// Probe one service and cache the verdict
    pub async fn check_health(&self, service_id: &str) -> HealthRecord {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.probe_timeout, self.probe.probe(service_id)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let record = match outcome {
            Ok(Ok(())) => HealthRecord {
                healthy: true,
                last_checked_at: Utc::now(),
                response_time_ms: Some(elapsed_ms),
                error: None,
            },
            Ok(Err(error)) => HealthRecord {
                healthy: false,
                last_checked_at: Utc::now(),
                response_time_ms: None,
                error: Some(error.to_string()),
            },
            Err(_) => HealthRecord {
                healthy: false,
                last_checked_at: Utc::now(),
                response_time_ms: None,
                error: Some(format!(
                    "Health probe timed out after {}ms",
                    self.probe_timeout.as_millis()
                )),
            },
        };

        if record.healthy {
            debug!(service_id = %service_id, response_time_ms = elapsed_ms, "💚 Health probe passed");
        } else {
            warn!(
                service_id = %service_id,
                error = record.error.as_deref().unwrap_or_default(),
                "💔 Health probe failed"
            );
        }

        self.records.insert(service_id.to_string(), record.clone());
        record
    }

    /// Probe every given service concurrently
    pub async fn check_all(&self, service_ids: &[String]) -> Vec<(String, HealthRecord)> {
        let checks = service_ids.iter().map(|service_id| async move {
            (service_id.clone(), self.check_health(service_id).await)
        });
        join_all(checks).await
    }

    /// Probe only the services that have never been checked
    pub async fn check_unknown(&self, service_ids: &[String]) {
        let unknown: Vec<String> = service_ids
            .iter()
            .filter(|id| !self.records.contains_key(id.as_str()))
            .cloned()
            .collect();

        if !unknown.is_empty() {
            debug!(services = ?unknown, "Probing services with no health record");
            self.check_all(&unknown).await;
        }
    }

    /// Last cached verdict; a service never checked is not healthy
    pub fn is_healthy(&self, service_id: &str) -> bool {
        self.records
            .get(service_id)
            .map(|record| record.healthy)
            .unwrap_or(false)
    }

    pub fn record(&self, service_id: &str) -> Option<HealthRecord> {
        self.records.get(service_id).map(|record| record.clone())
    }

    /// Healthy subset of `service_ids` in input order, or all of them if none are healthy
    pub fn filter_healthy(&self, service_ids: &[String]) -> Vec<String> {
        let healthy: Vec<String> = service_ids
            .iter()
            .filter(|id| self.is_healthy(id))
            .cloned()
            .collect();

        if healthy.is_empty() {
            service_ids.to_vec()
        } else {
            healthy
        }
    }

    /// Services that have a cached record
    pub fn tracked_services(&self) -> Vec<String> {
        self.records.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn snapshot(&self) -> BTreeMap<String, HealthRecord> {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutorError;
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct SetProbe {
        healthy: HashSet<String>,
        hang: HashSet<String>,
    }

    #[async_trait]
    impl HealthProbe for SetProbe {
        async fn probe(&self, service_id: &str) -> Result<(), ExecutorError> {
            if self.hang.contains(service_id) {
                std::future::pending::<()>().await;
            }
            if self.healthy.contains(service_id) {
                Ok(())
            } else {
                Err(ExecutorError::transient("capability listing failed"))
            }
        }
    }

    fn monitor(healthy: &[&str], hang: &[&str]) -> HealthMonitor {
        HealthMonitor::new(
            Arc::new(SetProbe {
                healthy: healthy.iter().map(|s| s.to_string()).collect(),
                hang: hang.iter().map(|s| s.to_string()).collect(),
            }),
            Duration::from_millis(50),
        )
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_check_health_records_verdict() {
        let monitor = monitor(&["svc-a"], &[]);

        let healthy = monitor.check_health("svc-a").await;
        assert!(healthy.healthy);
        assert!(healthy.response_time_ms.is_some());
        assert!(monitor.is_healthy("svc-a"));

        let unhealthy = monitor.check_health("svc-b").await;
        assert!(!unhealthy.healthy);
        assert!(unhealthy.error.unwrap().contains("capability listing failed"));
        assert!(!monitor.is_healthy("svc-b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_marks_unhealthy() {
        let monitor = monitor(&["svc-a"], &["svc-a"]);
        let record = monitor.check_health("svc-a").await;
        assert!(!record.healthy);
        assert!(record.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_filter_healthy_keeps_order_and_falls_back() {
        let monitor = monitor(&["svc-a", "svc-c"], &[]);
        monitor.check_all(&ids(&["svc-a", "svc-b", "svc-c"])).await;

        assert_eq!(
            monitor.filter_healthy(&ids(&["svc-c", "svc-b", "svc-a"])),
            ids(&["svc-c", "svc-a"])
        );
        // Nothing healthy: the unfiltered set comes back
        assert_eq!(monitor.filter_healthy(&ids(&["svc-b"])), ids(&["svc-b"]));
        assert!(monitor.filter_healthy(&[]).is_empty());
    }

    #[test]
    fn test_unchecked_service_is_not_healthy() {
        let monitor = monitor(&["svc-a"], &[]);
        assert!(!monitor.is_healthy("svc-a"));
        assert!(monitor.record("svc-a").is_none());
    }

    #[tokio::test]
    async fn test_check_unknown_skips_known_services() {
        let monitor = monitor(&["svc-a", "svc-b"], &[]);
        let first = monitor.check_health("svc-a").await;

        monitor.check_unknown(&ids(&["svc-a", "svc-b"])).await;

        assert_eq!(monitor.record("svc-a").unwrap().last_checked_at, first.last_checked_at);
        assert!(monitor.is_healthy("svc-b"));
        assert_eq!(monitor.snapshot().len(), 2);
    }
}
