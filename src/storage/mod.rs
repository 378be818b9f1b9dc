//! Cache-aside collection storage.
//!
//! Every collection lives as one blob in the local key/value store and,
//! when a remote is configured, at a path in the remote replica. Reads prefer
//! the remote under [`ReadPolicy::RemoteFirst`] and write through to the
//! local cache; writes land locally first and are mirrored to the remote on a
//! best-effort basis. Remote failures never fail a call. They are logged,
//! counted and kept in the sync ledger.

mod collection;
mod sync_status;

pub use collection::Collection;
pub use sync_status::{CollectionSync, SyncReport, SyncState};

use anyhow::{Result, anyhow};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock, broadcast};
use tracing::{debug, error, info, warn};

use crate::clients::RemoteStore;
use crate::config::{ReadPolicy, StorageConfig};
use crate::constants::keys;
use crate::db::Store;
use crate::domain::{ChangeSource, DeskEvent};
use crate::security::{deobfuscate, obfuscate};
use sync_status::SyncLedger;

pub struct Storage {
    store: Store,
    remote: Option<Arc<dyn RemoteStore>>,
    read_policy: ReadPolicy,
    obfuscate_local: bool,
    event_bus: broadcast::Sender<DeskEvent>,
    ledger: RwLock<SyncLedger>,
    mutation: Mutex<()>,
}

impl Storage {
    #[must_use]
    pub fn new(
        store: Store,
        remote: Option<Arc<dyn RemoteStore>>,
        config: &StorageConfig,
        event_bus: broadcast::Sender<DeskEvent>,
    ) -> Self {
        Self {
            store,
            remote,
            read_policy: config.read_policy,
            obfuscate_local: config.obfuscate_local,
            event_bus,
            ledger: RwLock::new(SyncLedger::default()),
            mutation: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn remote(&self) -> Option<Arc<dyn RemoteStore>> {
        self.remote.clone()
    }

    #[must_use]
    pub const fn event_bus(&self) -> &broadcast::Sender<DeskEvent> {
        &self.event_bus
    }

    /// Serializes read-modify-write sequences within this process.
    /// Hold the guard across the load and the save.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutation.lock().await
    }

    /// Loads a collection, falling back to its default when nothing usable is
    /// stored anywhere.
    ///
    /// Values that parse as JSON but hold records of the wrong shape are an
    /// error rather than the default, so a following save cannot overwrite
    /// the records that failed to decode.
    pub async fn load<T>(&self, collection: Collection) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        if let Some(value) = self.fetch_remote(collection).await {
            let data = decode_records::<T>(collection, "remote", value.clone())?;
            self.write_local(collection, &value).await?;
            return Ok(data);
        }

        Ok(self.load_local(collection).await?.unwrap_or_default())
    }

    /// Reads only the local cache. `None` when the key is missing or the blob
    /// is not JSON at all.
    pub async fn load_local<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Option<T>> {
        let Some(raw) = self.store.get_value(collection.local_key()).await? else {
            return Ok(None);
        };

        let Some(value) =
            deobfuscate::<Value>(&raw).or_else(|| serde_json::from_str::<Value>(&raw).ok())
        else {
            warn!(
                collection = %collection,
                "Local value could not be decoded, using default"
            );
            return Ok(None);
        };

        decode_records(collection, "local", value).map(Some)
    }

    /// Writes the local cache, then mirrors to the remote once.
    pub async fn save<T>(&self, collection: Collection, data: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(data)?;
        self.write_local(collection, &value).await?;

        metrics::counter!("storage_writes_total", "collection" => collection.remote_path())
            .increment(1);

        self.push_remote(collection, &value).await;

        let _ = self.event_bus.send(DeskEvent::CollectionChanged {
            collection,
            source: ChangeSource::Local,
        });
        Ok(())
    }

    /// Applies a value observed on the remote. Returns whether the local cache
    /// changed; nulls and values equal to the cache are ignored.
    pub async fn apply_remote_change(&self, collection: Collection, value: &Value) -> Result<bool> {
        if value.is_null() {
            return Ok(false);
        }

        let current = self.load_local::<Value>(collection).await?;
        if current.as_ref() == Some(value) {
            debug!(collection = %collection, "Remote echo matches local cache");
            return Ok(false);
        }

        self.write_local(collection, value).await?;
        self.ledger.write().await.success(collection);

        let _ = self.event_bus.send(DeskEvent::CollectionChanged {
            collection,
            source: ChangeSource::Remote,
        });
        Ok(true)
    }

    /// Takes the mutation lock and pulls every collection from the remote.
    pub async fn resync_from_remote(&self) -> Result<usize> {
        let _guard = self.lock().await;
        self.refresh_from_remote().await
    }

    /// Pulls every collection from the remote into the local cache.
    /// Returns the number of collections that changed. Callers hold the
    /// mutation lock.
    async fn refresh_from_remote(&self) -> Result<usize> {
        let mut changed = 0;
        if self.remote.is_none() {
            return Ok(changed);
        }

        for collection in Collection::ALL {
            if let Some(value) = self.fetch_remote_unconditionally(collection).await
                && self.apply_remote_change(collection, &value).await?
            {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Wipes the local store when its schema marker is not current, then
    /// seeds every missing key. Returns true when a wipe happened.
    pub async fn ensure_schema(&self) -> Result<bool> {
        let version = self.store.get_value(keys::VERSION).await?;
        let wiped = version.as_deref() != Some(keys::SCHEMA_VERSION);

        if wiped {
            let removed = self.store.clear_values().await?;
            self.store
                .set_value(keys::VERSION, keys::SCHEMA_VERSION)
                .await?;
            info!(
                previous = version.as_deref().unwrap_or("none"),
                removed, "Local store schema reset"
            );
        }

        for collection in Collection::ALL {
            if self.store.get_value(collection.local_key()).await?.is_none() {
                self.write_local(collection, &collection.default_value())
                    .await?;
            }
        }

        if self.store.get_value(keys::REQUESTS_ENABLED).await?.is_none() {
            self.store.set_value(keys::REQUESTS_ENABLED, "true").await?;
        }

        Ok(wiped)
    }

    /// Drops every local key and reseeds defaults. The remote is untouched.
    pub async fn reset_local(&self) -> Result<()> {
        self.store.clear_values().await?;
        self.ensure_schema().await?;
        Ok(())
    }

    /// Local-only string flag.
    pub async fn flag(&self, key: &str) -> Result<Option<String>> {
        self.store.get_value(key).await
    }

    pub async fn set_flag(&self, key: &str, value: &str) -> Result<()> {
        self.store.set_value(key, value).await
    }

    pub async fn sync_report(&self) -> SyncReport {
        SyncReport {
            remote_enabled: self.remote.is_some(),
            remote: self.remote.as_ref().map(|r| r.name()),
            read_policy: self.read_policy,
            collections: self.ledger.read().await.snapshot(),
        }
    }

    async fn write_local(&self, collection: Collection, value: &Value) -> Result<()> {
        let encoded = if self.obfuscate_local {
            obfuscate(value)?
        } else {
            value.to_string()
        };
        self.store
            .set_value(collection.local_key(), &encoded)
            .await
    }

    async fn fetch_remote(&self, collection: Collection) -> Option<Value> {
        if self.read_policy == ReadPolicy::LocalOnly {
            return None;
        }
        self.fetch_remote_unconditionally(collection).await
    }

    async fn fetch_remote_unconditionally(&self, collection: Collection) -> Option<Value> {
        let remote = self.remote.as_ref()?;

        match remote.get(collection.remote_path()).await {
            Ok(value) => {
                self.ledger.write().await.success(collection);
                value.filter(|v| !v.is_null())
            }
            Err(e) => {
                self.record_remote_failure(collection, "read", &e.to_string())
                    .await;
                None
            }
        }
    }

    async fn push_remote(&self, collection: Collection, value: &Value) {
        let Some(remote) = &self.remote else {
            return;
        };

        match remote.set(collection.remote_path(), value).await {
            Ok(()) => self.ledger.write().await.success(collection),
            Err(e) => {
                self.record_remote_failure(collection, "write", &e.to_string())
                    .await;
            }
        }
    }

    async fn record_remote_failure(&self, collection: Collection, operation: &str, error: &str) {
        warn!(
            collection = %collection,
            operation,
            error,
            "Remote {} failed, continuing with local cache",
            operation
        );
        metrics::counter!(
            "storage_remote_failures_total",
            "collection" => collection.remote_path(),
            "operation" => operation.to_string()
        )
        .increment(1);
        self.ledger.write().await.failure(collection, error);
    }
}

fn decode_records<T: DeserializeOwned>(
    collection: Collection,
    origin: &str,
    value: Value,
) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        error!(
            collection = %collection,
            origin,
            error = %e,
            "Stored records do not decode, refusing to continue"
        );
        anyhow!("{origin} {collection} holds records that do not decode: {e}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MemoryRemote;
    use crate::models::{GameStatus, LogCategory, LogEntry};
    use serde_json::json;

    async fn storage_with(
        remote: Option<MemoryRemote>,
        config: StorageConfig,
    ) -> (Storage, broadcast::Receiver<DeskEvent>) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let (tx, rx) = broadcast::channel(32);
        let remote = remote.map(|r| Arc::new(r) as Arc<dyn RemoteStore>);
        let storage = Storage::new(store, remote, &config, tx);
        storage.ensure_schema().await.unwrap();
        (storage, rx)
    }

    fn log(message: &str) -> LogEntry {
        LogEntry {
            category: LogCategory::System,
            message: message.to_string(),
            user: "System".to_string(),
            timestamp: "1/1/2026, 0:00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_seeded_defaults() {
        let (storage, _) = storage_with(None, StorageConfig::default()).await;

        let logs: Vec<LogEntry> = storage.load(Collection::Logs).await.unwrap();
        assert!(logs.is_empty());

        let game: GameStatus = storage.load(Collection::GameStatus).await.unwrap();
        assert!(!game.available);

        assert_eq!(
            storage.flag(keys::REQUESTS_ENABLED).await.unwrap().as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_local_blob_is_obfuscated() {
        let (storage, _) = storage_with(None, StorageConfig::default()).await;
        storage.save(Collection::Logs, &vec![log("hello")]).await.unwrap();

        let raw = storage.store().get_value("bt_logs").await.unwrap().unwrap();
        assert!(!raw.contains("hello"));

        let logs: Vec<LogEntry> = storage.load(Collection::Logs).await.unwrap();
        assert_eq!(logs, vec![log("hello")]);
    }

    #[tokio::test]
    async fn test_raw_json_is_accepted() {
        let config = StorageConfig {
            obfuscate_local: false,
            ..StorageConfig::default()
        };
        let (storage, _) = storage_with(None, config).await;
        storage.save(Collection::Logs, &vec![log("plain")]).await.unwrap();

        let raw = storage.store().get_value("bt_logs").await.unwrap().unwrap();
        assert!(raw.contains("plain"));

        let logs: Vec<LogEntry> = storage.load(Collection::Logs).await.unwrap();
        assert_eq!(logs.len(), 1);
    }

    #[tokio::test]
    async fn test_garbage_local_value_yields_default() {
        let (storage, _) = storage_with(None, StorageConfig::default()).await;
        storage
            .store()
            .set_value("bt_bugs", "%%% not a blob %%%")
            .await
            .unwrap();

        let bugs: Vec<crate::models::BugReport> = storage.load(Collection::Bugs).await.unwrap();
        assert!(bugs.is_empty());
    }

    #[tokio::test]
    async fn test_misshapen_local_records_are_not_overwritten() {
        let (storage, _) = storage_with(None, StorageConfig::default()).await;
        let raw = r#"[{"recipient":"ana","type":"mystery","title":"t","message":"m","timestamp":"now"}]"#;
        storage
            .store()
            .set_value("bt_notifications", raw)
            .await
            .unwrap();

        let loaded: Result<Vec<crate::models::Notification>> =
            storage.load(Collection::Notifications).await;
        assert!(loaded.is_err());
        assert_eq!(
            storage.store().get_value("bt_notifications").await.unwrap().as_deref(),
            Some(raw)
        );
    }

    #[tokio::test]
    async fn test_misshapen_remote_records_are_an_error() {
        let remote = MemoryRemote::new();
        let (storage, _) = storage_with(Some(remote.clone()), StorageConfig::default()).await;
        let users = json!([{"username": "ana", "password": "x", "role": "user"}]);
        remote.set("users", &users).await.unwrap();

        let loaded: Result<Vec<crate::models::User>> = storage.load(Collection::Users).await;
        assert!(loaded.is_err());
        assert_eq!(remote.get("users").await.unwrap(), Some(users));
    }

    #[tokio::test]
    async fn test_remote_wins_and_fills_cache() {
        let remote = MemoryRemote::new();
        remote
            .set("gameStatus", &json!({"available": true, "link": "https://play"}))
            .await
            .unwrap();
        let (storage, _) = storage_with(Some(remote.clone()), StorageConfig::default()).await;

        let game: GameStatus = storage.load(Collection::GameStatus).await.unwrap();
        assert!(game.available);

        remote.set_offline(true);
        let cached: GameStatus = storage.load(Collection::GameStatus).await.unwrap();
        assert_eq!(cached.link, "https://play");
    }

    #[tokio::test]
    async fn test_local_only_ignores_remote_reads() {
        let remote = MemoryRemote::new();
        remote.set("logs", &json!([log("remote")])).await.unwrap();
        let config = StorageConfig {
            read_policy: ReadPolicy::LocalOnly,
            ..StorageConfig::default()
        };
        let (storage, _) = storage_with(Some(remote.clone()), config).await;

        let logs: Vec<LogEntry> = storage.load(Collection::Logs).await.unwrap();
        assert!(logs.is_empty());

        storage.save(Collection::Logs, &vec![log("local")]).await.unwrap();
        assert_eq!(
            remote.get("logs").await.unwrap(),
            Some(serde_json::to_value(vec![log("local")]).unwrap())
        );
    }

    #[tokio::test]
    async fn test_remote_failure_is_recorded_not_raised() {
        let remote = MemoryRemote::new();
        remote.set_offline(true);
        let (storage, mut rx) = storage_with(Some(remote), StorageConfig::default()).await;

        storage.save(Collection::Logs, &vec![log("offline")]).await.unwrap();
        let logs: Vec<LogEntry> = storage.load(Collection::Logs).await.unwrap();
        assert_eq!(logs.len(), 1);

        let report = storage.sync_report().await;
        let entry = report
            .collections
            .iter()
            .find(|c| c.collection == Collection::Logs)
            .unwrap();
        assert!(entry.degraded);
        assert!(entry.state.failures >= 2);

        assert_eq!(
            rx.recv().await.unwrap(),
            DeskEvent::CollectionChanged {
                collection: Collection::Logs,
                source: ChangeSource::Local,
            }
        );
    }

    #[tokio::test]
    async fn test_apply_remote_change_skips_echo() {
        let (storage, mut rx) = storage_with(None, StorageConfig::default()).await;
        storage.save(Collection::Logs, &vec![log("a")]).await.unwrap();
        let _ = rx.recv().await;

        let same = serde_json::to_value(vec![log("a")]).unwrap();
        assert!(!storage.apply_remote_change(Collection::Logs, &same).await.unwrap());
        assert!(!storage
            .apply_remote_change(Collection::Logs, &Value::Null)
            .await
            .unwrap());

        let newer = serde_json::to_value(vec![log("b"), log("a")]).unwrap();
        assert!(storage.apply_remote_change(Collection::Logs, &newer).await.unwrap());
        assert_eq!(
            rx.recv().await.unwrap(),
            DeskEvent::CollectionChanged {
                collection: Collection::Logs,
                source: ChangeSource::Remote,
            }
        );
    }

    #[tokio::test]
    async fn test_resync_waits_for_mutation_lock() {
        let remote = MemoryRemote::new();
        remote.set("logs", &json!([log("remote")])).await.unwrap();
        let (storage, _) = storage_with(Some(remote), StorageConfig::default()).await;
        let storage = Arc::new(storage);

        let guard = storage.lock().await;
        let task = tokio::spawn({
            let storage = storage.clone();
            async move { storage.resync_from_remote().await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(!task.is_finished());
        let cached: Option<Vec<LogEntry>> = storage.load_local(Collection::Logs).await.unwrap();
        assert_eq!(cached, Some(Vec::new()));

        drop(guard);
        assert_eq!(task.await.unwrap().unwrap(), 1);
        let cached: Option<Vec<LogEntry>> = storage.load_local(Collection::Logs).await.unwrap();
        assert_eq!(cached, Some(vec![log("remote")]));
    }

    #[tokio::test]
    async fn test_schema_mismatch_wipes_store() {
        let (storage, _) = storage_with(None, StorageConfig::default()).await;
        storage.save(Collection::Logs, &vec![log("old")]).await.unwrap();
        storage.store().set_value(keys::VERSION, "1.0").await.unwrap();

        assert!(storage.ensure_schema().await.unwrap());
        let logs: Vec<LogEntry> = storage.load(Collection::Logs).await.unwrap();
        assert!(logs.is_empty());

        assert!(!storage.ensure_schema().await.unwrap());
    }
}
