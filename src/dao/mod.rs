/// Match snapshot storage backends.
pub mod match_store;
/// Persisted match model.
pub mod models;
/// Storage error shared by every backend.
pub mod storage;
