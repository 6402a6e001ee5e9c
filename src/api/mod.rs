//! API Module
//!
//! HTTP host for the worker: platform events arrive as POST requests and
//! every other path is fetched through the interceptor.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache statistics and lifecycle state
//! - `GET /notifications` - Notifications currently shown
//! - `GET /clients` - Application windows and the calls made on them
//! - `POST /events/{install,activate,push,notificationclick,message,sync}`
//! - anything else - proxied through the worker

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
