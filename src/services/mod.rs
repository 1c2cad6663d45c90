/// Scoreboard operations and the commit that follows each change.
pub mod board_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Fire-and-forget push to the broadcast overlay.
pub mod overlay;
/// Debounced background writer for match snapshots.
pub mod persistence;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
