//! Configuration Module
//!
//! Handles loading worker and host configuration from environment variables.
//! Every component receives its settings through [`WorkerConfig`]; nothing is
//! read from globals at event time.

use std::env;
use std::time::Duration;

use url::Url;

/// Cache bucket name for the current resource generation.
pub const DEFAULT_CACHE_VERSION: &str = "security-companion-v1.0.0";

/// Origin the application pages are served from.
pub const DEFAULT_APP_ORIGIN: &str = "http://localhost:3000";

/// Style/script CDN allowed through the interceptor.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://cdn.tailwindcss.com";

/// Resources cached eagerly at install time.
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/codes.html",
    "/radio.html",
    "/incident.html",
    "/shift.html",
    "/reports.html",
    "/patrol.html",
    "/profile.html",
    "/manifest.json",
    "/app.js",
    "/patch-bg.png",
    "https://cdn.tailwindcss.com",
];

/// Host configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Origin the host forwards network fetches to
    pub upstream_origin: Url,
    /// Settings handed to the worker components
    pub worker: WorkerConfig,
}

/// Settings shared by the cache store, interceptor, push receiver and router.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Origin the application runs under
    pub app_origin: Url,
    /// Name of the current cache bucket
    pub cache_version: String,
    /// Paths (root-relative) and absolute URLs cached on install
    pub manifest: Vec<String>,
    /// Page served to offline navigations
    pub start_page: String,
    /// Cross-origin hosts treated like the app origin
    pub allowed_origins: Vec<Url>,
    /// Upper bound on a single network fetch
    pub fetch_timeout: Duration,
    /// Values merged under every push payload
    pub notifications: NotificationDefaults,
    /// Deep links for the persistent mission notification
    pub mission: MissionRoutes,
}

/// Fallback values for decoded notifications.
#[derive(Debug, Clone)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub tag: String,
}

/// Routes for the always-on mission notification.
#[derive(Debug, Clone)]
pub struct MissionRoutes {
    pub tag: String,
    pub start_patrol_url: String,
    pub create_incident_url: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `UPSTREAM_ORIGIN` - Origin fetches are forwarded to (default: http://127.0.0.1:8080)
    /// - `APP_ORIGIN` - Origin of the application (default: http://localhost:3000)
    /// - `CACHE_VERSION` - Current cache bucket name (default: security-companion-v1.0.0)
    /// - `ALLOWED_ORIGINS` - Comma separated cross-origin allow-list (default: https://cdn.tailwindcss.com)
    /// - `FETCH_TIMEOUT_MS` - Network timeout in milliseconds (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut worker = defaults.worker;
        if let Some(origin) = env::var("APP_ORIGIN").ok().and_then(|v| Url::parse(&v).ok()) {
            worker.app_origin = origin;
        }
        if let Ok(version) = env::var("CACHE_VERSION") {
            if !version.trim().is_empty() {
                worker.cache_version = version.trim().to_string();
            }
        }
        if let Ok(list) = env::var("ALLOWED_ORIGINS") {
            worker.allowed_origins = parse_origin_list(&list);
        }
        if let Some(timeout) = env::var("FETCH_TIMEOUT_MS")
            .ok()
            .and_then(|v| parse_timeout_ms(&v))
        {
            worker.fetch_timeout = timeout;
        }

        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            upstream_origin: env::var("UPSTREAM_ORIGIN")
                .ok()
                .and_then(|v| Url::parse(&v).ok())
                .unwrap_or(defaults.upstream_origin),
            worker,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            upstream_origin: Url::parse("http://127.0.0.1:8080").expect("valid default upstream"),
            worker: WorkerConfig::default(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            app_origin: Url::parse(DEFAULT_APP_ORIGIN).expect("valid default origin"),
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            manifest: DEFAULT_MANIFEST.iter().map(|p| p.to_string()).collect(),
            start_page: "/index.html".to_string(),
            allowed_origins: parse_origin_list(DEFAULT_ALLOWED_ORIGIN),
            fetch_timeout: Duration::from_secs(10),
            notifications: NotificationDefaults::default(),
            mission: MissionRoutes::default(),
        }
    }
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: "Security Companion".to_string(),
            body: "New notification from Security Companion".to_string(),
            icon: "/patch-bg.png".to_string(),
            badge: "/patch-bg.png".to_string(),
            vibrate: vec![200, 100, 200],
            tag: "default".to_string(),
        }
    }
}

impl Default for MissionRoutes {
    fn default() -> Self {
        Self {
            tag: "persistent-mission".to_string(),
            start_patrol_url: "/patrol.html?autostart=true".to_string(),
            create_incident_url: "/incident.html?fromnoti=true".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Resolves a root-relative path or absolute URL against the app origin.
    pub fn resolve(&self, target: &str) -> Option<Url> {
        self.app_origin.join(target).ok()
    }

    /// True when `url` shares the application's origin.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.app_origin.origin()
    }

    /// True when `url` is same-origin or on the cross-origin allow-list.
    pub fn is_allowed_origin(&self, url: &Url) -> bool {
        self.is_same_origin(url)
            || self
                .allowed_origins
                .iter()
                .any(|allowed| allowed.origin() == url.origin())
    }
}

/// Parses a positive millisecond count. Zero would time out every fetch.
fn parse_timeout_ms(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

/// Parses a comma separated list of origins, skipping malformed entries.
fn parse_origin_list(list: &str) -> Vec<Url> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| Url::parse(s).ok())
        .collect()
}
