#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod file;

use crate::dao::models::PersistedMatch;
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over where the current match snapshot is kept.
pub trait MatchStore: Send + Sync {
    /// Fetch the stored match, if any.
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<PersistedMatch>>>;
    /// Overwrite the stored match.
    fn save(&self, snapshot: PersistedMatch) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove the stored match; succeeds when there is none.
    fn clear(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish whatever the backend needs (directory, database).
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
