//! # Queue Processor
//!
//! Drains the priority lanes in strict order: the high lane until empty, then normal, then
//! low. Tasks are routed one at a time. A failed task is logged and dropped; it never stops
//! the rest of the drain.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::queue::PriorityQueues;
use super::router::Router;
use crate::models::Priority;

/// What one drain pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    pub routed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct QueueProcessor {
    queues: Arc<PriorityQueues>,
    router: Arc<Router>,
}

impl QueueProcessor {
    pub fn new(queues: Arc<PriorityQueues>, router: Arc<Router>) -> Self {
        Self { queues, router }
    }

    /// Run one drain pass over all lanes
    pub async fn drain_once(&self) -> DrainReport {
        let mut report = DrainReport::default();

        for priority in Priority::ALL {
            while let Some(task) = self.queues.pop(priority) {
                report.routed += 1;

                match self.router.route_task_detailed(&task).await {
                    Ok(result) => {
                        report.succeeded += 1;
                        debug!(
                            task_id = %task.id,
                            priority = %priority,
                            service_id = %result.service_id,
                            "Queued task completed"
                        );
                    }
                    Err(failure) => {
                        report.failed += 1;
                        error!(
                            task_id = %task.id,
                            priority = %priority,
                            attempts = failure.attempts,
                            error_code = failure.error.code(),
                            error = %failure.error,
                            "Queued task failed"
                        );
                    }
                }
            }
        }

        if report.routed > 0 {
            info!(
                routed = report.routed,
                succeeded = report.succeeded,
                failed = report.failed,
                "📤 Queue drain complete"
            );
        }

        report
    }
}
