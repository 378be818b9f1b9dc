use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{RwLock, broadcast};

use super::remote::{RemoteChange, RemoteError, RemoteStore};

/// Process-local remote. Writes are visible to every clone and announced to
/// watchers, which makes it a stand-in for a shared realtime store.
#[derive(Clone)]
pub struct MemoryRemote {
    data: Arc<RwLock<HashMap<String, Value>>>,
    changes: broadcast::Sender<RemoteChange>,
    offline: Arc<AtomicBool>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            changes,
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Simulates an unreachable remote: every call fails until reset.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RemoteError::Offline)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn get(&self, path: &str) -> Result<Option<Value>, RemoteError> {
        self.check_online()?;
        Ok(self
            .data
            .read()
            .await
            .get(path)
            .filter(|v| !v.is_null())
            .cloned())
    }

    async fn set(&self, path: &str, value: &Value) -> Result<(), RemoteError> {
        self.check_online()?;
        self.data
            .write()
            .await
            .insert(path.to_string(), value.clone());

        let _ = self.changes.send(RemoteChange {
            path: path.to_string(),
            value: value.clone(),
        });
        Ok(())
    }

    fn watch(&self, paths: &[&str]) -> broadcast::Receiver<RemoteChange> {
        let (tx, rx) = broadcast::channel(64);
        let mut upstream = self.changes.subscribe();
        let paths: Vec<String> = paths.iter().map(ToString::to_string).collect();
        let data = self.data.clone();

        tokio::spawn(async move {
            {
                let snapshot = data.read().await;
                for path in &paths {
                    if let Some(value) = snapshot.get(path) {
                        let _ = tx.send(RemoteChange {
                            path: path.clone(),
                            value: value.clone(),
                        });
                    }
                }
            }

            loop {
                match upstream.recv().await {
                    Ok(change) => {
                        if paths.contains(&change.path) && tx.send(change).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        rx
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_set_round_trip() {
        let remote = MemoryRemote::new();
        assert_eq!(remote.get("users").await.unwrap(), None);

        remote.set("users", &json!([{"username": "ana"}])).await.unwrap();
        assert_eq!(
            remote.get("users").await.unwrap(),
            Some(json!([{"username": "ana"}]))
        );
    }

    #[tokio::test]
    async fn test_offline_fails_every_call() {
        let remote = MemoryRemote::new();
        remote.set_offline(true);

        assert!(matches!(
            remote.get("users").await,
            Err(RemoteError::Offline)
        ));
        assert!(remote.set("users", &json!([])).await.is_err());

        remote.set_offline(false);
        assert!(remote.set("users", &json!([])).await.is_ok());
    }

    #[tokio::test]
    async fn test_watch_only_delivers_watched_paths() {
        let remote = MemoryRemote::new();
        let mut rx = remote.watch(&["users"]);
        tokio::task::yield_now().await;

        remote.set("bugs", &json!([1])).await.unwrap();
        remote.set("users", &json!([2])).await.unwrap();

        let change = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change.path, "users");
        assert_eq!(change.value, json!([2]));
    }
}
