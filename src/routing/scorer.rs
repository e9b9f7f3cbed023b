//! # Service Scorer
//!
//! Ranks candidate services from a base score of 100:
//!
//! | Signal | Adjustment |
//! | --- | --- |
//! | avg successful response > 5000ms / > 2000ms | -30 / -15 |
//! | load > 0.8 / > 0.5 | -25 / -10 |
//! | success rate < 0.90 / < 0.95 | -20 / -10 |
//! | high priority task on a priority-capable service | +15 |
//!
//! Within each row the tiers are exclusive. Ties keep input order.

use std::collections::HashSet;
use std::sync::Arc;

use super::metrics::{MetricsStore, ServiceStats};
use super::traits::LoadSource;
use crate::constants::scoring;
use crate::models::{Priority, ServiceScore};

/// Score one candidate from its history and load
pub fn compute_score(
    stats: &ServiceStats,
    load: f64,
    priority: Priority,
    priority_capable: bool,
) -> i32 {
    let mut score = scoring::BASE_SCORE;

    if let Some(avg) = stats.avg_response_time_ms() {
        if avg > scoring::SLOW_RESPONSE_MS {
            score -= scoring::SLOW_RESPONSE_PENALTY;
        } else if avg > scoring::ELEVATED_RESPONSE_MS {
            score -= scoring::ELEVATED_RESPONSE_PENALTY;
        }
    }

    if load > scoring::HIGH_LOAD {
        score -= scoring::HIGH_LOAD_PENALTY;
    } else if load > scoring::MODERATE_LOAD {
        score -= scoring::MODERATE_LOAD_PENALTY;
    }

    let success_rate = stats.success_rate();
    if success_rate < scoring::LOW_SUCCESS_RATE {
        score -= scoring::LOW_SUCCESS_PENALTY;
    } else if success_rate < scoring::REDUCED_SUCCESS_RATE {
        score -= scoring::REDUCED_SUCCESS_PENALTY;
    }

    if priority == Priority::High && priority_capable {
        score += scoring::PRIORITY_CAPABLE_BONUS;
    }

    score
}

/// Ranked candidates, best first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    pub services: Vec<String>,
    /// Empty when ranking was skipped for zero or one candidate
    pub scores: Vec<ServiceScore>,
}

impl Ranking {
    pub fn top(&self) -> Option<&str> {
        self.services.first().map(String::as_str)
    }
}

pub struct ServiceScorer {
    metrics: Arc<MetricsStore>,
    load: Arc<dyn LoadSource>,
    priority_capable: HashSet<String>,
}

impl std::fmt::Debug for ServiceScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceScorer")
            .field("priority_capable", &self.priority_capable)
            .finish()
    }
}

impl ServiceScorer {
    pub fn new<I, S>(metrics: Arc<MetricsStore>, load: Arc<dyn LoadSource>, priority_capable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metrics,
            load,
            priority_capable: priority_capable.into_iter().map(Into::into).collect(),
        }
    }

    pub fn score(&self, service_id: &str, priority: Priority) -> i32 {
        let stats = self.metrics.service_stats(service_id);
        let load = self
            .load
            .load(service_id)
            .filter(|value| value.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);

        compute_score(
            &stats,
            load,
            priority,
            self.priority_capable.contains(service_id),
        )
    }

    /// Rank candidates by score, highest first; stable for equal scores
    pub fn rank(&self, service_ids: &[String], priority: Priority) -> Ranking {
        if service_ids.len() <= 1 {
            return Ranking {
                services: service_ids.to_vec(),
                scores: Vec::new(),
            };
        }

        let mut scores: Vec<ServiceScore> = service_ids
            .iter()
            .map(|service_id| ServiceScore {
                service_id: service_id.clone(),
                score: self.score(service_id, priority),
            })
            .collect();

        scores.sort_by(|a, b| b.score.cmp(&a.score));

        Ranking {
            services: scores.iter().map(|s| s.service_id.clone()).collect(),
            scores,
        }
    }
}
