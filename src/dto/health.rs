use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Configured storage backend ("file" or "couch").
    pub storage: String,
}

impl HealthResponse {
    /// The board is live and snapshots reach storage.
    pub fn ok(storage: &str) -> Self {
        Self {
            status: "ok".to_string(),
            storage: storage.to_string(),
        }
    }

    /// The board is live but snapshots are held back until storage returns.
    pub fn degraded(storage: &str) -> Self {
        Self {
            status: "degraded".to_string(),
            storage: storage.to_string(),
        }
    }
}
