//! # Event Publisher
//!
//! Broadcasts [`RoutingEvent`]s to any number of subscribers. Publishing never blocks; events
//! sent with no subscriber attached are dropped, and slow receivers observe `Lagged`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::constants::{defaults, events};
use crate::models::Priority;

/// Notifications emitted by the routing engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RoutingEvent {
    CircuitOpened {
        service_id: String,
        consecutive_failures: u32,
    },
    CircuitClosed {
        service_id: String,
    },
    TaskQueued {
        task_id: Uuid,
        priority: Priority,
        /// Depth of the task's lane after the enqueue
        queue_size: usize,
    },
}

impl RoutingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RoutingEvent::CircuitOpened { .. } => events::CIRCUIT_OPENED,
            RoutingEvent::CircuitClosed { .. } => events::CIRCUIT_CLOSED,
            RoutingEvent::TaskQueued { .. } => events::TASK_QUEUED,
        }
    }
}

/// Event that has been published
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedEvent {
    pub event: RoutingEvent,
    pub published_at: DateTime<Utc>,
}

/// Best-effort broadcast publisher for routing notifications
///
/// Publishing never blocks or fails: with no subscribers the event is dropped, and slow
/// subscribers observe `RecvError::Lagged` rather than holding up the router.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: RoutingEvent) {
        let published = PublishedEvent {
            event,
            published_at: Utc::now(),
        };

        // send() only errors when nobody is listening, which is fine for notifications
        let _ = self.sender.send(published);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(defaults::EVENT_CHANNEL_CAPACITY)
    }
}
