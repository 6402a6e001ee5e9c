//! Notification Module
//!
//! Notification descriptors and click routing.

mod descriptor;
mod router;

pub use descriptor::{NotificationAction, NotificationDescriptor};
pub use router::{actions, ClickEvent, NotificationRouter, RouteOutcome};
