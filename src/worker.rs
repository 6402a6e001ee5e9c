//! Worker dispatcher
//!
//! Maps inbound platform events onto the component that handles them and
//! tracks the install/activate lifecycle.
//!
//! # Events
//! - `Install` / `Activate`: cache bucket creation and rotation
//! - `Fetch`: cache-first interception (only once activated)
//! - `Push`: notification display
//! - `NotificationClick`: window routing
//! - `Message`: `SKIP_WAITING` activates an installed worker immediately
//! - `Sync`: background sync tags, acknowledged and logged

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{ActivateReport, CacheStore, InstallReport};
use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::fetch::{fetch_with_timeout, FetchInterceptor, FetchOutcome, Request, Response, ResponseSource};
use crate::notification::{ClickEvent, NotificationDescriptor, NotificationRouter, RouteOutcome};
use crate::platform::{CacheStorage, Network, NotificationDisplay, WindowClients};
use crate::push::PushReceiver;

/// One-off sync tag replayed when connectivity returns.
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// Periodic sync tag for content refresh.
pub const CONTENT_SYNC_TAG: &str = "content-sync";

// == Lifecycle ==
/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Installation failed; the worker handles no fetches
    Redundant,
}

impl WorkerState {
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }
}

/// Message posted to the worker by a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    SkipWaiting,
    #[serde(other)]
    Unknown,
}

/// Inbound event.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    /// Raw push payload, if the message carried one
    Push(Option<Vec<u8>>),
    NotificationClick(ClickEvent),
    Message(WorkerMessage),
    Sync { tag: String, periodic: bool },
}

/// Result of handling an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Fetched(FetchOutcome),
    Displayed(NotificationDescriptor),
    Routed(RouteOutcome),
    /// Sync handled (true) or tag unknown (false)
    Synced(bool),
    /// Nothing to do
    Acknowledged,
}

/// Ports the worker runs against.
#[derive(Clone)]
pub struct Platform {
    pub storage: Arc<dyn CacheStorage>,
    pub network: Arc<dyn Network>,
    pub display: Arc<dyn NotificationDisplay>,
    pub clients: Arc<dyn WindowClients>,
}

// == Service Worker ==
/// Explicit event dispatcher over the cache, fetch, push and routing components.
pub struct ServiceWorker {
    config: Arc<WorkerConfig>,
    cache: Arc<CacheStore>,
    network: Arc<dyn Network>,
    interceptor: FetchInterceptor,
    push: PushReceiver,
    router: NotificationRouter,
    state: RwLock<WorkerState>,
}

impl std::fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("version", &self.config.cache_version)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl ServiceWorker {
    pub fn new(config: WorkerConfig, platform: Platform) -> Self {
        let config = Arc::new(config);
        let cache = Arc::new(CacheStore::new(platform.storage, config.clone()));
        let interceptor = FetchInterceptor::new(cache.clone(), platform.network.clone(), config.clone());
        let push = PushReceiver::new(platform.display.clone(), config.clone());
        let router = NotificationRouter::new(platform.display, platform.clients, config.clone());

        Self {
            config,
            cache,
            network: platform.network,
            interceptor,
            push,
            router,
            state: RwLock::new(WorkerState::Parsed),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn set_state(&self, next: WorkerState) {
        let mut state = self.state.write().await;
        debug!("Worker state {:?} -> {:?}", *state, next);
        *state = next;
    }

    // == Dispatch ==
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome> {
        match event {
            WorkerEvent::Install => self.install().await.map(EventOutcome::Installed),
            WorkerEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            WorkerEvent::Fetch(request) => self.fetch(&request).await.map(EventOutcome::Fetched),
            WorkerEvent::Push(payload) => self
                .push
                .receive(payload.as_deref())
                .await
                .map(EventOutcome::Displayed),
            WorkerEvent::NotificationClick(click) => {
                self.router.route(&click).await.map(EventOutcome::Routed)
            }
            WorkerEvent::Message(message) => self.message(message).await,
            WorkerEvent::Sync { tag, periodic } => Ok(EventOutcome::Synced(self.sync(&tag, periodic))),
        }
    }

    async fn install(&self) -> Result<InstallReport> {
        self.set_state(WorkerState::Installing).await;
        match self.cache.install(self.network.as_ref()).await {
            Ok(report) => {
                self.set_state(WorkerState::Installed).await;
                Ok(report)
            }
            Err(e) => {
                warn!("Cache installation failed: {}", e);
                self.set_state(WorkerState::Redundant).await;
                Err(e)
            }
        }
    }

    /// Checks `ready` and moves to `Activating` under one write guard.
    ///
    /// Returns the previous state, or the current one if `ready` refused it.
    async fn begin_activation(
        &self,
        ready: impl Fn(WorkerState) -> bool,
    ) -> std::result::Result<WorkerState, WorkerState> {
        let mut state = self.state.write().await;
        let previous = *state;
        if !ready(previous) {
            return Err(previous);
        }
        debug!("Worker state {:?} -> {:?}", previous, WorkerState::Activating);
        *state = WorkerState::Activating;
        Ok(previous)
    }

    async fn finish_activation(&self, previous: WorkerState) -> Result<ActivateReport> {
        match self.cache.activate().await {
            Ok(report) => {
                self.set_state(WorkerState::Activated).await;
                info!("Worker activated with cache {}", report.version);
                Ok(report)
            }
            Err(e) => {
                self.set_state(previous).await;
                Err(e)
            }
        }
    }

    async fn activate(&self) -> Result<ActivateReport> {
        let previous = self
            .begin_activation(|s| matches!(s, WorkerState::Installed | WorkerState::Activated))
            .await
            .map_err(|current| {
                WorkerError::InvalidRequest(format!("cannot activate a worker in state {:?}", current))
            })?;
        self.finish_activation(previous).await
    }

    async fn fetch(&self, request: &Request) -> Result<FetchOutcome> {
        if !self.state().await.can_intercept_fetch() {
            return Ok(FetchOutcome::Passthrough);
        }
        self.interceptor.handle(request).await
    }

    async fn message(&self, message: WorkerMessage) -> Result<EventOutcome> {
        match message {
            WorkerMessage::SkipWaiting => {
                match self.begin_activation(|s| s == WorkerState::Installed).await {
                    Ok(previous) => self.finish_activation(previous).await.map(EventOutcome::Activated),
                    Err(_) => Ok(EventOutcome::Acknowledged),
                }
            }
            WorkerMessage::Unknown => {
                debug!("Ignoring unknown worker message");
                Ok(EventOutcome::Acknowledged)
            }
        }
    }

    fn sync(&self, tag: &str, periodic: bool) -> bool {
        let expected = if periodic { CONTENT_SYNC_TAG } else { BACKGROUND_SYNC_TAG };
        if tag == expected {
            info!("{} sync triggered", if periodic { "Periodic" } else { "Background" });
            true
        } else {
            debug!("Ignoring sync tag {}", tag);
            false
        }
    }

    /// Answers a request the way the platform would: through the interceptor,
    /// or straight from the network when the request is passed through.
    pub async fn respond(&self, request: Request) -> Result<(Response, Option<ResponseSource>)> {
        match self.fetch(&request).await? {
            FetchOutcome::Respond { response, source } => Ok((response, Some(source))),
            FetchOutcome::Passthrough => {
                let response =
                    fetch_with_timeout(self.network.as_ref(), &request, self.config.fetch_timeout).await?;
                Ok((response, None))
            }
        }
    }
}
