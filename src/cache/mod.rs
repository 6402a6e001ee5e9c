//! Cache Module
//!
//! Versioned resource cache backed by a [`CacheStorage`](crate::platform::CacheStorage).

mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, ResourceEntry};
pub use stats::CacheStats;
pub use store::{ActivateReport, CacheStore, InstallFailure, InstallReport};
