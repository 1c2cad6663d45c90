pub mod board;
pub mod rally;
pub mod serve_engine;
mod sse;
pub mod tally;
pub mod undo;

use std::sync::Arc;

use tokio::sync::{RwLock, mpsc, watch};

use crate::{
    config::AppConfig,
    dao::match_store::MatchStore,
    services::{overlay::OverlayPublisher, persistence::PersistCommand},
    state::board::Scoreboard,
};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Central application state: the live scoreboard, its storage handle and the
/// outbound channels fed after every change.
pub struct AppState {
    board: RwLock<Scoreboard>,
    match_store: RwLock<Option<Arc<dyn MatchStore>>>,
    sse: SseHub,
    degraded: watch::Sender<bool>,
    persist: mpsc::UnboundedSender<PersistCommand>,
    overlay: OverlayPublisher,
    config: AppConfig,
}

impl AppState {
    /// Construct the shared state and the receiving end of the persistence queue.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> (SharedState, mpsc::UnboundedReceiver<PersistCommand>) {
        let (degraded_tx, _rx) = watch::channel(true);
        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Self {
            board: RwLock::new(Scoreboard::new()),
            match_store: RwLock::new(None),
            sse: SseHub::new(config.sse_capacity),
            degraded: degraded_tx,
            persist: persist_tx,
            overlay: OverlayPublisher::new(config.overlay_endpoint.as_deref()),
            config,
        });
        (state, persist_rx)
    }

    /// The live scoreboard. Writers hold the guard for one whole operation.
    pub fn board(&self) -> &RwLock<Scoreboard> {
        &self.board
    }

    /// Obtain a handle to the current match store, if one is installed.
    pub async fn match_store(&self) -> Option<Arc<dyn MatchStore>> {
        let guard = self.match_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new match store implementation and leave degraded mode.
    pub async fn install_match_store(&self, store: Arc<dyn MatchStore>) {
        {
            let mut guard = self.match_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current match store and enter degraded mode.
    pub async fn clear_match_store(&self) {
        {
            let mut guard = self.match_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Overlay push target.
    pub fn overlay(&self) -> &OverlayPublisher {
        &self.overlay
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Hand a command to the persistence writer. Dropped silently once the writer is gone.
    pub fn queue_persist(&self, command: PersistCommand) {
        let _ = self.persist.send(command);
    }
}
