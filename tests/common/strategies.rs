use proptest::prelude::*;
use routing_core::models::Priority;
use routing_core::routing::ServiceStats;

/// Strategy for generating priorities
pub fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::High),
        Just(Priority::Normal),
        Just(Priority::Low),
    ]
}

/// Strategy for generating service ids
pub fn service_id_strategy() -> impl Strategy<Value = String> {
    "svc-[a-z]{1,8}"
}

/// Strategy for generating load values, including out-of-range and non-finite ones
pub fn load_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(0.0),
        Just(0.5),
        Just(0.8),
        0.0f64..=1.0,
        Just(-0.5),
        Just(1.5),
        Just(f64::NAN),
        Just(f64::INFINITY),
    ]
}

/// Strategy for generating (successful, failed) call counts with at least one success
pub fn call_counts_strategy() -> impl Strategy<Value = (u64, u64)> {
    (1u64..500, 0u64..100)
}

/// Build stats whose successful calls average `avg_ms`
pub fn stats_with_average(successful: u64, failed: u64, avg_ms: u64) -> ServiceStats {
    ServiceStats {
        total: successful + failed,
        successful,
        failed,
        total_response_time_ms: successful * avg_ms,
    }
}

/// Strategy for generating executor outcomes as (success, response_time_ms)
pub fn outcomes_strategy() -> impl Strategy<Value = Vec<(bool, u64)>> {
    prop::collection::vec((any::<bool>(), 0u64..60_000), 0..200)
}
