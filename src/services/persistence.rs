//! Debounced background writer for match snapshots.
//!
//! Board operations never wait on storage: they queue a [`PersistCommand`]
//! and move on. The writer keeps only the newest command, waits for a quiet
//! period, then hands it to the installed [`MatchStore`](crate::dao::match_store::MatchStore).
//! Failed writes are held back until storage comes back or a newer command arrives.

use tokio::{sync::mpsc, time::sleep};
use tracing::{debug, info, warn};

use crate::{dao::models::PersistedMatch, error::ServiceError, state::SharedState};

/// Work item for the persistence writer.
#[derive(Debug, Clone)]
pub enum PersistCommand {
    /// Overwrite the stored match with this snapshot.
    Save(Box<PersistedMatch>),
    /// Drop the stored match.
    Clear,
}

impl PersistCommand {
    fn label(&self) -> &'static str {
        match self {
            PersistCommand::Save(_) => "save",
            PersistCommand::Clear => "clear",
        }
    }
}

/// Drain `receiver` until every sender is gone, writing the latest command after each quiet period.
pub async fn run(state: SharedState, mut receiver: mpsc::UnboundedReceiver<PersistCommand>) {
    let debounce = state.config().save_debounce;
    let mut degraded = state.degraded_watcher();
    let mut pending: Option<PersistCommand> = None;
    let mut stalled = false;

    loop {
        tokio::select! {
            command = receiver.recv() => match command {
                Some(command) => {
                    pending = Some(command);
                    stalled = false;
                }
                None => break,
            },
            changed = degraded.changed(), if stalled => {
                if changed.is_err() {
                    break;
                }
                stalled = *degraded.borrow_and_update();
            }
            _ = sleep(debounce), if pending.is_some() && !stalled => {
                if let Some(command) = pending.take() {
                    if let Err(err) = write(&state, &command).await {
                        warn!(command = command.label(), error = %err, "match snapshot not persisted; keeping it for retry");
                        pending = Some(command);
                        stalled = true;
                    }
                }
            }
        }
    }

    if let Some(command) = pending {
        if let Err(err) = write(&state, &command).await {
            warn!(command = command.label(), error = %err, "dropping unsaved match snapshot on shutdown");
        }
    }
    info!("persistence writer stopped");
}

async fn write(state: &SharedState, command: &PersistCommand) -> Result<(), ServiceError> {
    let store = state.match_store().await.ok_or(ServiceError::Degraded)?;
    match command {
        PersistCommand::Save(snapshot) => store.save(snapshot.as_ref().clone()).await?,
        PersistCommand::Clear => store.clear().await?,
    }
    debug!(command = command.label(), "match snapshot persisted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::match_store::{MatchStore, file::FileMatchStore},
        state::{AppState, board::Scoreboard},
    };

    fn quick_config() -> AppConfig {
        AppConfig {
            save_debounce: Duration::from_millis(5),
            overlay_endpoint: None,
            ..AppConfig::default()
        }
    }

    async fn wait_for<F, Fut>(mut probe: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..200 {
            if probe().await {
                return true;
            }
            sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn latest_snapshot_reaches_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileMatchStore::new(dir.path().join("match.json")));
        let (state, receiver) = AppState::new(quick_config());
        state.install_match_store(store.clone()).await;
        tokio::spawn(run(state.clone(), receiver));

        let first = PersistedMatch::from(&Scoreboard::new());
        let second = PersistedMatch::from(&Scoreboard::new());
        state.queue_persist(PersistCommand::Save(Box::new(first)));
        state.queue_persist(PersistCommand::Save(Box::new(second.clone())));

        let expected = second.id;
        assert!(
            wait_for(|| {
                let store = store.clone();
                async move { matches!(store.load().await, Ok(Some(ref m)) if m.id == expected) }
            })
            .await
        );
    }

    #[tokio::test]
    async fn pending_snapshot_waits_for_storage() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileMatchStore::new(dir.path().join("match.json")));
        let (state, receiver) = AppState::new(quick_config());
        tokio::spawn(run(state.clone(), receiver));

        let snapshot = PersistedMatch::from(&Scoreboard::new());
        state.queue_persist(PersistCommand::Save(Box::new(snapshot.clone())));
        sleep(Duration::from_millis(50)).await;
        assert!(store.load().await.unwrap().is_none());

        state.install_match_store(store.clone()).await;
        assert!(
            wait_for(|| {
                let store = store.clone();
                async move { store.load().await.ok().flatten().is_some() }
            })
            .await
        );
    }
}
