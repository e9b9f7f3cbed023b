//! # Priority Queues
//!
//! Three FIFO lanes (high, normal, low). Order within a lane is never changed; lane
//! selection is left to the caller so a drain can exhaust one lane before the next.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::models::{Priority, Task};

/// Depth of each lane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSizes {
    pub high: usize,
    pub normal: usize,
    pub low: usize,
}

impl QueueSizes {
    pub fn total(&self) -> usize {
        self.high + self.normal + self.low
    }
}

#[derive(Debug, Default)]
struct Lanes {
    high: VecDeque<Task>,
    normal: VecDeque<Task>,
    low: VecDeque<Task>,
}

impl Lanes {
    fn lane_mut(&mut self, priority: Priority) -> &mut VecDeque<Task> {
        match priority {
            Priority::High => &mut self.high,
            Priority::Normal => &mut self.normal,
            Priority::Low => &mut self.low,
        }
    }
}

#[derive(Debug, Default)]
pub struct PriorityQueues {
    lanes: Mutex<Lanes>,
}

impl PriorityQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the task to its priority lane, returning that lane's new depth
    pub fn enqueue(&self, task: Task) -> usize {
        let mut lanes = self.lanes.lock();
        let lane = lanes.lane_mut(task.priority);
        lane.push_back(task);
        lane.len()
    }

    /// Oldest task in the given lane
    pub fn pop(&self, priority: Priority) -> Option<Task> {
        self.lanes.lock().lane_mut(priority).pop_front()
    }

    /// Oldest task of the highest non-empty lane
    pub fn pop_next(&self) -> Option<Task> {
        let mut lanes = self.lanes.lock();
        Priority::ALL
            .iter()
            .find_map(|priority| lanes.lane_mut(*priority).pop_front())
    }

    pub fn sizes(&self) -> QueueSizes {
        let lanes = self.lanes.lock();
        QueueSizes {
            high: lanes.high.len(),
            normal: lanes.normal.len(),
            low: lanes.low.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.sizes().total()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
