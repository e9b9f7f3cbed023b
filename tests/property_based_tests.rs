mod common;

use common::strategies::*;
use proptest::prelude::*;
use routing_core::models::{Priority, RoutingDecision, Task};
use routing_core::resilience::BackoffPolicy;
use routing_core::routing::{compute_score, MetricsStore, PriorityQueues, ServiceScorer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn decision(index: usize) -> RoutingDecision {
    RoutingDecision {
        id: uuid::Uuid::new_v4(),
        timestamp: chrono::Utc::now(),
        task_id: uuid::Uuid::new_v4(),
        description: format!("task-{index}"),
        priority: Priority::Normal,
        attempt: 1,
        recommended: Vec::new(),
        available: Vec::new(),
        healthy: Vec::new(),
        selected: "svc-a".to_string(),
        scores: Vec::new(),
        reasoning: Vec::new(),
        allocation: None,
    }
}

proptest! {
    /// Property: a faster service never scores lower than an otherwise identical slower one
    #[test]
    fn faster_service_never_scores_lower(
        (successful, failed) in call_counts_strategy(),
        fast_ms in 0u64..20_000,
        extra_ms in 0u64..20_000,
        load in load_strategy(),
        priority in priority_strategy(),
        capable in any::<bool>(),
    ) {
        let fast = stats_with_average(successful, failed, fast_ms);
        let slow = stats_with_average(successful, failed, fast_ms + extra_ms);

        prop_assert!(
            compute_score(&fast, load, priority, capable) >= compute_score(&slow, load, priority, capable)
        );
    }

    /// Property: scores stay within the reachable band
    #[test]
    fn scores_are_bounded(
        (successful, failed) in call_counts_strategy(),
        avg_ms in 0u64..60_000,
        load in load_strategy(),
        priority in priority_strategy(),
        capable in any::<bool>(),
    ) {
        let score = compute_score(&stats_with_average(successful, failed, avg_ms), load, priority, capable);
        prop_assert!((25..=115).contains(&score));
    }

    /// Property: reported loads are sanitized before scoring
    #[test]
    fn scorer_sanitizes_reported_load(
        load in load_strategy(),
        priority in priority_strategy(),
    ) {
        let loads = HashMap::from([("svc-a".to_string(), load)]);
        let scorer = ServiceScorer::new(
            Arc::new(MetricsStore::default()),
            Arc::new(common::FixedLoad(loads)),
            Vec::<String>::new(),
        );
        let sanitized = if load.is_finite() { load.clamp(0.0, 1.0) } else { 0.0 };

        prop_assert_eq!(
            scorer.score("svc-a", priority),
            compute_score(&Default::default(), sanitized, priority, false)
        );
    }

    /// Property: backoff is capped, non-decreasing and doubles below the cap
    #[test]
    fn backoff_is_capped_and_monotonic(
        base_ms in 1u64..5_000,
        extra_ms in 0u64..60_000,
        attempt in 1u32..64,
    ) {
        let policy = BackoffPolicy::new(
            Duration::from_millis(base_ms),
            Duration::from_millis(base_ms + extra_ms),
        );
        let delay = policy.delay_for_attempt(attempt);
        let next = policy.delay_for_attempt(attempt + 1);

        prop_assert!(delay <= policy.max_delay);
        prop_assert!(delay >= policy.base_delay);
        prop_assert!(next >= delay);
        if next < policy.max_delay {
            prop_assert_eq!(next, delay * 2);
        }
    }

    /// Property: service counters always balance and rates stay in [0, 1]
    #[test]
    fn service_stats_stay_consistent(
        service_id in service_id_strategy(),
        outcomes in outcomes_strategy(),
    ) {
        let store = MetricsStore::default();
        for (success, response_time_ms) in &outcomes {
            store.record_outcome(&service_id, *success, *response_time_ms);
        }

        let stats = store.service_stats(&service_id);
        prop_assert_eq!(stats.total, stats.successful + stats.failed);
        prop_assert_eq!(stats.total, outcomes.len() as u64);
        prop_assert!((0.0..=1.0).contains(&stats.success_rate()));
    }

    /// Property: the decision buffer never exceeds capacity and keeps the newest entries
    #[test]
    fn decision_buffer_is_bounded(capacity in 1usize..50, count in 0usize..200) {
        let store = MetricsStore::new(capacity);
        for index in 0..count {
            store.record_decision(decision(index));
        }

        prop_assert_eq!(store.decision_count(), count.min(capacity));
        let recent = store.recent_decisions(capacity);
        if let Some(last) = recent.last() {
            prop_assert_eq!(&last.description, &format!("task-{}", count - 1));
        }
    }

    /// Property: draining lane by lane preserves per-lane enqueue order
    #[test]
    fn lanes_preserve_fifo(priorities in prop::collection::vec(priority_strategy(), 0..100)) {
        let queues = PriorityQueues::new();
        for (index, priority) in priorities.iter().enumerate() {
            queues.enqueue(Task::new(index.to_string()).with_priority(*priority));
        }

        let mut drained = Vec::new();
        while let Some(task) = queues.pop_next() {
            drained.push((task.priority, task.description.parse::<usize>().unwrap()));
        }

        prop_assert_eq!(drained.len(), priorities.len());
        // Non-decreasing lane rank, and increasing index within each lane
        for pair in drained.windows(2) {
            prop_assert!(pair[0].0 <= pair[1].0);
            if pair[0].0 == pair[1].0 {
                prop_assert!(pair[0].1 < pair[1].1);
            }
        }
    }
}
