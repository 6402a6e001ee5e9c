//! Response DTOs for the worker host API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{ActivateReport, CacheStats, InstallReport};
use crate::notification::{NotificationDescriptor, RouteOutcome};
use crate::platform::{WindowCall, WindowClient};
use crate::worker::WorkerState;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Lifecycle state of the worker
    pub state: WorkerState,
    /// Current cache bucket
    pub cache_version: String,
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub rejected: u64,
    pub buckets_deleted: u64,
    /// Entries in the current bucket
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Notifications shown since startup
    pub notifications_shown: u64,
}

impl StatsResponse {
    pub fn new(state: WorkerState, cache_version: impl Into<String>, stats: &CacheStats, notifications_shown: u64) -> Self {
        Self {
            state,
            cache_version: cache_version.into(),
            hits: stats.hits,
            misses: stats.misses,
            stores: stats.stores,
            rejected: stats.rejected,
            buckets_deleted: stats.buckets_deleted,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
            notifications_shown,
        }
    }
}

/// Response body for POST /events/install
#[derive(Debug, Clone, Serialize)]
pub struct InstallResponse {
    pub state: WorkerState,
    #[serde(flatten)]
    pub report: InstallReport,
}

/// Response body for POST /events/activate and a SKIP_WAITING message
#[derive(Debug, Clone, Serialize)]
pub struct ActivateResponse {
    pub state: WorkerState,
    #[serde(flatten)]
    pub report: ActivateReport,
}

/// Response body for POST /events/push
#[derive(Debug, Clone, Serialize)]
pub struct PushResponse {
    pub displayed: NotificationDescriptor,
}

/// Response body for POST /events/notificationclick
#[derive(Debug, Clone, Serialize)]
pub struct ClickResponse {
    #[serde(flatten)]
    pub outcome: RouteOutcome,
}

/// Response body for POST /events/message and POST /events/sync
#[derive(Debug, Clone, Serialize)]
pub struct AckResponse {
    pub state: WorkerState,
    /// False when the event was recognized but nothing was done
    pub handled: bool,
}

/// Response body for GET /notifications
#[derive(Debug, Clone, Serialize)]
pub struct NotificationsResponse {
    pub visible: Vec<NotificationDescriptor>,
    pub shown_total: u64,
}

/// Response body for GET /clients
#[derive(Debug, Clone, Serialize)]
pub struct ClientsResponse {
    pub windows: Vec<WindowClient>,
    /// Calls made on windows, oldest first
    pub calls: Vec<WindowCall>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_copies_counters() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_store();
        stats.set_total_entries(4);

        let resp = StatsResponse::new(WorkerState::Activated, "v1", &stats, 3);
        assert_eq!(resp.hits, 2);
        assert_eq!(resp.total_entries, 4);
        assert!((resp.hit_rate - 2.0 / 3.0).abs() < 0.001);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["state"], "activated");
        assert_eq!(json["cache_version"], "v1");
        assert_eq!(json["notifications_shown"], 3);
    }

    #[test]
    fn test_install_response_flattens_report() {
        let resp = InstallResponse {
            state: WorkerState::Installed,
            report: InstallReport {
                version: "v2".to_string(),
                cached: vec!["/".to_string()],
                failed: vec![],
            },
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["state"], "installed");
        assert_eq!(json["version"], "v2");
        assert_eq!(json["cached"][0], "/");
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("Something went wrong"));
    }
}
