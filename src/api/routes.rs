//! API Routes
//!
//! Configures the Axum router with the worker host endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    activate_handler, click_handler, clients_handler, health_handler, install_handler, message_handler,
    notifications_handler, proxy_handler, push_handler, stats_handler, sync_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// Every path not listed below is fetched through the worker's interceptor.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/notifications", get(notifications_handler))
        .route("/clients", get(clients_handler))
        .route("/events/install", post(install_handler))
        .route("/events/activate", post(activate_handler))
        .route("/events/push", post(push_handler))
        .route("/events/notificationclick", post(click_handler))
        .route("/events/message", post(message_handler))
        .route("/events/sync", post(sync_handler))
        .fallback(proxy_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
