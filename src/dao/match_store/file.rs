//! JSON file backend keeping the current match next to the server.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::fs;

use crate::dao::{
    match_store::MatchStore,
    models::PersistedMatch,
    storage::{StorageError, StorageResult},
};

/// Failures of the file backend.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// Reading, writing or removing the file failed.
    #[error("i/o failure on `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file exists but does not hold a match snapshot.
    #[error("failed to decode match snapshot in `{path}`")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The snapshot could not be encoded.
    #[error("failed to encode match snapshot")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}

impl From<FileStoreError> for StorageError {
    fn from(err: FileStoreError) -> Self {
        let message = err.to_string();
        match err {
            FileStoreError::Decode { .. } => StorageError::corrupt(message, err),
            _ => StorageError::unavailable(message, err),
        }
    }
}

/// Stores the match as a single pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct FileMatchStore {
    path: Arc<Path>,
}

impl FileMatchStore {
    /// Store writing to `path`. Parent directories are created on demand.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::from(path.into()),
        }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> FileStoreError {
        FileStoreError::Io {
            path: self.path.to_path_buf(),
            source,
        }
    }

    async fn ensure_parent(&self) -> Result<(), FileStoreError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source)),
            _ => Ok(()),
        }
    }

    async fn read(&self) -> Result<Option<PersistedMatch>, FileStoreError> {
        let contents = match fs::read_to_string(&*self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| FileStoreError::Decode {
                path: self.path.to_path_buf(),
                source,
            })
    }

    /// Write to a sibling temp file, then rename over the snapshot.
    async fn write(&self, snapshot: &PersistedMatch) -> Result<(), FileStoreError> {
        let body = serde_json::to_vec_pretty(snapshot)
            .map_err(|source| FileStoreError::Encode { source })?;
        self.ensure_parent().await?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)
            .await
            .map_err(|source| self.io_error(source))?;
        fs::rename(&tmp, &*self.path)
            .await
            .map_err(|source| self.io_error(source))
    }

    async fn remove(&self) -> Result<(), FileStoreError> {
        match fs::remove_file(&*self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

impl MatchStore for FileMatchStore {
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<PersistedMatch>>> {
        let store = self.clone();
        Box::pin(async move { store.read().await.map_err(Into::into) })
    }

    fn save(&self, snapshot: PersistedMatch) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.write(&snapshot).await.map_err(Into::into) })
    }

    fn clear(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.remove().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) else {
                return Ok(());
            };
            fs::metadata(parent)
                .await
                .map(|_| ())
                .map_err(|source| store.io_error(source).into())
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_parent().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::board::Scoreboard;

    fn store_in(dir: &tempfile::TempDir) -> FileMatchStore {
        FileMatchStore::new(dir.path().join("matches").join("current.json"))
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_returns_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let snapshot = PersistedMatch::from(&Scoreboard::new());

        store.save(snapshot.clone()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(snapshot));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(PersistedMatch::from(&Scoreboard::new()))
            .await
            .unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn garbage_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.try_reconnect().await.unwrap();
        fs::write(store.path(), b"{not json").await.unwrap();

        assert!(matches!(
            store.load().await,
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn health_tracks_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.health_check().await.is_err());
        store.try_reconnect().await.unwrap();
        assert!(store.health_check().await.is_ok());
    }
}
