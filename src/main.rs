//! Pickleball scoreboard binary entrypoint wiring REST, SSE, persistence and overlay layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod dao;
mod dto;
mod error;
mod routes;
mod services;
mod state;

use config::{AppConfig, StoreConfig};
use dao::{
    match_store::{MatchStore, file::FileMatchStore},
    storage::StorageError,
};
use services::{persistence, sse_events, storage_supervisor};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store_config = config.store.clone();
    let (app_state, persist_rx) = AppState::new(config);

    tokio::spawn(persistence::run(app_state.clone(), persist_rx));
    tokio::spawn(sse_events::forward_degraded_changes(app_state.clone()));
    tokio::spawn(storage_supervisor::run(app_state.clone(), move || {
        connect_store(store_config.clone())
    }));
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Open the configured match store, creating its file or database when missing.
async fn connect_store(config: StoreConfig) -> Result<Arc<dyn MatchStore>, StorageError> {
    match config {
        StoreConfig::File { path } => {
            let store = FileMatchStore::new(path);
            store.try_reconnect().await?;
            info!(path = %store.path().display(), "using file match store");
            Ok(Arc::new(store))
        }
        #[cfg(feature = "couch-store")]
        StoreConfig::Couch => {
            use dao::match_store::couchdb::{CouchConfig, CouchMatchStore};

            let couch = CouchConfig::from_env()?;
            let store = CouchMatchStore::connect(couch).await?;
            info!("using CouchDB match store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "couch-store"))]
        StoreConfig::Couch => Err(StorageError::unavailable(
            "CouchDB backend requested but the `couch-store` feature is disabled".into(),
            std::io::Error::other("couch-store feature disabled"),
        )),
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: state::SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
