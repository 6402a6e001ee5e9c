//! API Handlers
//!
//! HTTP request handlers that turn host requests into worker events.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response as HttpResponse},
    Json,
};
use tracing::debug;

use crate::config::{Config, WorkerConfig};
use crate::error::{Result, WorkerError};
use crate::fetch::{Request, RequestMode, Response};
use crate::models::{
    AckResponse, ActivateResponse, ClickRequest, ClickResponse, ClientsResponse, HealthResponse,
    InstallResponse, NotificationsResponse, PushResponse, StatsResponse, SyncRequest,
};
use crate::platform::{HttpNetwork, MemoryCacheStorage, Network, NotificationCenter, WindowRegistry};
use crate::worker::{EventOutcome, Platform, ServiceWorker, WorkerEvent, WorkerMessage};

/// Header naming where a proxied response came from.
pub const SERVED_FROM_HEADER: &str = "x-served-from";

/// Largest request body the proxy forwards.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Application state shared across all handlers.
///
/// The worker runs against in-memory cache storage, notifications and
/// windows; only the network port talks to the outside world.
#[derive(Clone)]
pub struct AppState {
    pub worker: Arc<ServiceWorker>,
    /// Notifications displayed by the worker
    pub notifications: Arc<NotificationCenter>,
    /// Application windows the router can focus, navigate and open
    pub windows: Arc<WindowRegistry>,
}

impl AppState {
    /// Creates a new AppState with the given network port.
    pub fn new(config: WorkerConfig, network: Arc<dyn Network>) -> Self {
        let notifications = Arc::new(NotificationCenter::new());
        let windows = Arc::new(WindowRegistry::new());
        let worker = ServiceWorker::new(
            config,
            Platform {
                storage: Arc::new(MemoryCacheStorage::new()),
                network,
                display: notifications.clone(),
                clients: windows.clone(),
            },
        );

        Self {
            worker: Arc::new(worker),
            notifications,
            windows,
        }
    }

    /// Creates a new AppState from configuration, forwarding fetches upstream.
    pub fn from_config(config: &Config) -> Self {
        let network = HttpNetwork::new(config.worker.app_origin.clone(), config.upstream_origin.clone());
        Self::new(config.worker.clone(), Arc::new(network))
    }
}

fn unexpected(outcome: EventOutcome) -> WorkerError {
    WorkerError::Internal(format!("unexpected event outcome: {:?}", outcome))
}

/// Handler for POST /events/install
pub async fn install_handler(State(state): State<AppState>) -> Result<Json<InstallResponse>> {
    match state.worker.dispatch(WorkerEvent::Install).await? {
        EventOutcome::Installed(report) => Ok(Json(InstallResponse {
            state: state.worker.state().await,
            report,
        })),
        other => Err(unexpected(other)),
    }
}

/// Handler for POST /events/activate
pub async fn activate_handler(State(state): State<AppState>) -> Result<Json<ActivateResponse>> {
    match state.worker.dispatch(WorkerEvent::Activate).await? {
        EventOutcome::Activated(report) => Ok(Json(ActivateResponse {
            state: state.worker.state().await,
            report,
        })),
        other => Err(unexpected(other)),
    }
}

/// Handler for POST /events/push
///
/// The raw body is the push payload; an empty body is a push without data.
pub async fn push_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<PushResponse>> {
    let payload = (!body.is_empty()).then(|| body.to_vec());
    match state.worker.dispatch(WorkerEvent::Push(payload)).await? {
        EventOutcome::Displayed(displayed) => Ok(Json(PushResponse { displayed })),
        other => Err(unexpected(other)),
    }
}

/// Handler for POST /events/notificationclick
pub async fn click_handler(
    State(state): State<AppState>,
    Json(req): Json<ClickRequest>,
) -> Result<Json<ClickResponse>> {
    match state.worker.dispatch(WorkerEvent::NotificationClick(req.into())).await? {
        EventOutcome::Routed(outcome) => Ok(Json(ClickResponse { outcome })),
        other => Err(unexpected(other)),
    }
}

/// Handler for POST /events/message
pub async fn message_handler(
    State(state): State<AppState>,
    Json(message): Json<WorkerMessage>,
) -> Result<Json<AckResponse>> {
    let handled = match state.worker.dispatch(WorkerEvent::Message(message)).await? {
        EventOutcome::Activated(_) => true,
        EventOutcome::Acknowledged => false,
        other => return Err(unexpected(other)),
    };
    Ok(Json(AckResponse {
        state: state.worker.state().await,
        handled,
    }))
}

/// Handler for POST /events/sync
pub async fn sync_handler(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> Result<Json<AckResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(WorkerError::InvalidRequest(error_msg));
    }

    let event = WorkerEvent::Sync {
        tag: req.tag,
        periodic: req.periodic,
    };
    match state.worker.dispatch(event).await? {
        EventOutcome::Synced(handled) => Ok(Json(AckResponse {
            state: state.worker.state().await,
            handled,
        })),
        other => Err(unexpected(other)),
    }
}

/// Handler for GET /notifications
pub async fn notifications_handler(State(state): State<AppState>) -> Json<NotificationsResponse> {
    Json(NotificationsResponse {
        visible: state.notifications.visible().await,
        shown_total: state.notifications.shown_total().await,
    })
}

/// Handler for GET /clients
pub async fn clients_handler(State(state): State<AppState>) -> Json<ClientsResponse> {
    Json(ClientsResponse {
        windows: state.windows.windows().await,
        calls: state.windows.calls().await,
    })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let cache = state.worker.cache();
    let stats = cache.stats().await?;

    Ok(Json(StatsResponse::new(
        state.worker.state().await,
        cache.version(),
        &stats,
        state.notifications.shown_total().await,
    )))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

// == Proxy ==
/// Fallback handler: any other path is fetched through the worker.
pub async fn proxy_handler(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> Result<HttpResponse> {
    let request = into_worker_request(state.worker.config(), request).await?;
    debug!(method = %request.method, url = %request.url, mode = ?request.mode, "proxying request");

    let (response, source) = state.worker.respond(request).await?;
    let served_from = source.map(|s| s.as_str()).unwrap_or("passthrough");
    into_http_response(response, served_from)
}

async fn into_worker_request(config: &WorkerConfig, request: axum::extract::Request) -> Result<Request> {
    let (parts, body) = request.into_parts();

    // Only path and query come from the request, so `//host/x` stays on the app origin
    let mut url = config.app_origin.clone();
    url.set_path(parts.uri.path());
    url.set_query(parts.uri.query());

    let mode = parts
        .headers
        .get("sec-fetch-mode")
        .and_then(|v| v.to_str().ok())
        .map(RequestMode::from_header)
        .unwrap_or_default();

    let mut worker_request = Request::new(parts.method.as_str(), url.as_str())?.with_mode(mode);
    for (name, value) in &parts.headers {
        if *name == header::HOST {
            continue;
        }
        if let Ok(value) = value.to_str() {
            worker_request = worker_request.with_header(name.as_str(), value);
        }
    }

    if parts.method != Method::GET && parts.method != Method::HEAD {
        let bytes = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| WorkerError::InvalidRequest(format!("unreadable body: {}", e)))?;
        worker_request = worker_request.with_body(bytes.to_vec());
    }

    Ok(worker_request)
}

fn into_http_response(response: Response, served_from: &'static str) -> Result<HttpResponse> {
    let status = StatusCode::from_u16(response.status)
        .map_err(|e| WorkerError::Internal(format!("bad upstream status {}: {}", response.status, e)))?;

    let mut http = (status, Body::from(response.body)).into_response();
    let headers = http.headers_mut();
    for (name, value) in &response.headers {
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) else {
            continue;
        };
        if name == header::CONTENT_LENGTH || name == header::TRANSFER_ENCODING || name == header::CONNECTION {
            continue;
        }
        headers.append(name, value);
    }
    headers.insert(SERVED_FROM_HEADER, HeaderValue::from_static(served_from));

    Ok(http)
}
