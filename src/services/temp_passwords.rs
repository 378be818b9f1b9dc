use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Short-lived plaintext passwords that an admin may reveal right after an
/// account is created or its password changed. Process memory only.
pub struct TempPasswordCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl TempPasswordCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn set(&self, username: &str, password: &str) {
        self.entries
            .write()
            .await
            .insert(username.to_string(), (password.to_string(), Instant::now()));
    }

    /// The cached password, unless it has outlived the TTL.
    pub async fn get(&self, username: &str) -> Option<String> {
        self.entries
            .read()
            .await
            .get(username)
            .filter(|(_, set_at)| set_at.elapsed() <= self.ttl)
            .map(|(password, _)| password.clone())
    }

    pub async fn remove(&self, username: &str) {
        self.entries.write().await.remove(username);
    }

    /// Drops expired entries and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (_, set_at)| set_at.elapsed() <= self.ttl);
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, "Expired temporary passwords purged");
        }
        purged
    }
}
