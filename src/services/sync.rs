//! Mirrors remote changes on watched collections into the local cache.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::clients::RemoteChange;
use crate::storage::{Collection, Storage};

pub struct RemoteSync {
    storage: Arc<Storage>,
}

impl RemoteSync {
    #[must_use]
    pub const fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Spawns the listener. Returns `None` when no remote is configured.
    pub fn start(self: Arc<Self>) -> Option<JoinHandle<()>> {
        let remote = self.storage.remote()?;
        let paths: Vec<&str> = Collection::WATCHED
            .iter()
            .map(|c| c.remote_path())
            .collect();
        let mut rx = remote.watch(&paths);
        info!(remote = remote.name(), ?paths, "Remote listener started");

        Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        if let Err(e) = self.handle_change(&change).await {
                            error!(path = %change.path, error = %e, "Failed to apply remote change");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        warn!(count, "Remote listener lagged, resyncing");
                        if let Err(e) = self.storage.resync_from_remote().await {
                            error!(error = %e, "Resync after lag failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        error!("Remote listener channel closed");
                        break;
                    }
                }
            }
        }))
    }

    /// Returns whether the local cache changed.
    pub async fn handle_change(&self, change: &RemoteChange) -> anyhow::Result<bool> {
        let Some(collection) = Collection::from_remote_path(&change.path) else {
            debug!(path = %change.path, "Ignoring change on unknown path");
            return Ok(false);
        };

        let _guard = self.storage.lock().await;
        let changed = self
            .storage
            .apply_remote_change(collection, &change.value)
            .await?;
        if changed {
            info!(event = "remote_change_applied", collection = %collection, "Local cache updated from remote");
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MemoryRemote, RemoteStore};
    use crate::config::StorageConfig;
    use crate::db::Store;
    use crate::domain::{ChangeSource, DeskEvent};
    use crate::models::GameStatus;
    use serde_json::json;
    use std::time::Duration;

    async fn storage_with_remote() -> (Arc<Storage>, Arc<MemoryRemote>) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let remote = Arc::new(MemoryRemote::new());
        let (tx, _) = broadcast::channel(64);
        let storage = Storage::new(
            store,
            Some(remote.clone() as Arc<dyn RemoteStore>),
            &StorageConfig::default(),
            tx,
        );
        storage.ensure_schema().await.unwrap();
        (Arc::new(storage), remote)
    }

    #[tokio::test]
    async fn test_handle_change_ignores_unknown_and_null() {
        let (storage, _) = storage_with_remote().await;
        let sync = RemoteSync::new(storage);

        let unknown = RemoteChange {
            path: "leaderboard".into(),
            value: json!([1, 2]),
        };
        assert!(!sync.handle_change(&unknown).await.unwrap());

        let null = RemoteChange {
            path: "users".into(),
            value: serde_json::Value::Null,
        };
        assert!(!sync.handle_change(&null).await.unwrap());
    }

    #[tokio::test]
    async fn test_listener_mirrors_remote_writes() {
        let (storage, remote) = storage_with_remote().await;
        let mut events = storage.event_bus().subscribe();
        let sync = Arc::new(RemoteSync::new(storage.clone()));
        let handle = sync.start().unwrap();

        remote
            .set("gameStatus", &json!({"available": true, "link": "https://play"}))
            .await
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Ok(event @ DeskEvent::CollectionChanged { .. }) = events.recv().await {
                    return event;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(
            event,
            DeskEvent::CollectionChanged {
                collection: Collection::GameStatus,
                source: ChangeSource::Remote,
            }
        );

        let status: Option<GameStatus> = storage.load_local(Collection::GameStatus).await.unwrap();
        assert!(status.unwrap().available);
        handle.abort();
    }

    #[tokio::test]
    async fn test_no_listener_without_remote() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let (tx, _) = broadcast::channel(8);
        let storage = Arc::new(Storage::new(store, None, &StorageConfig::default(), tx));
        assert!(Arc::new(RemoteSync::new(storage)).start().is_none());
    }
}
