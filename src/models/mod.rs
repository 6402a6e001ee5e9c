//! Request and Response models for the worker host API
//!
//! DTOs used for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::{ClickRequest, SyncRequest};
pub use responses::{
    AckResponse, ActivateResponse, ClickResponse, ClientsResponse, ErrorResponse, HealthResponse,
    InstallResponse, NotificationsResponse, PushResponse, StatsResponse,
};
