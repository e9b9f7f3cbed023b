pub mod decision;
pub mod task;

pub use decision::{RoutingDecision, ServiceScore};
pub use task::{Priority, Task};
