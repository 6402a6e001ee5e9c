//! Companion Worker - offline cache and push notifications for Security Companion
//!
//! Versioned resource caching, cache-first fetch interception, push message
//! display and notification click routing, driven through an explicit event
//! dispatcher and hosted over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod notification;
pub mod platform;
pub mod push;
pub mod worker;

#[cfg(test)]
mod testing;

pub use api::AppState;
pub use config::{Config, WorkerConfig};
pub use error::{Result, WorkerError};
pub use worker::{EventOutcome, Platform, ServiceWorker, WorkerEvent, WorkerState};
