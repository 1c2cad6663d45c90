use tracing::warn;

use crate::{config::StoreConfig, dto::health::HealthResponse, state::SharedState};

/// Probe the installed store and report the degraded flag.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.match_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        None => warn!("storage unavailable (degraded mode)"),
    }

    let storage = match state.config().store {
        StoreConfig::File { .. } => "file",
        StoreConfig::Couch => "couch",
    };

    if state.is_degraded() {
        HealthResponse::degraded(storage)
    } else {
        HealthResponse::ok(storage)
    }
}
