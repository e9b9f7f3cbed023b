//! # Routing Notifications
//!
//! Observer-style events (`circuit-opened`, `circuit-closed`, `task-queued`) for external
//! logging and alerting. The publisher is optional everywhere it is accepted.

pub mod publisher;

pub use publisher::{EventPublisher, PublishedEvent, RoutingEvent};
