use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tracing::info;

use crate::clients::{FirebaseClient, MemoryRemote, RemoteStore};
use crate::config::{Config, RemoteConfig, RemoteKind};
use crate::db::Store;
use crate::domain::DeskEvent;
use crate::services::{RemoteSync, Scheduler, Services};
use crate::storage::Storage;

/// Builds the configured remote replica, if any.
pub fn build_remote(config: &RemoteConfig) -> anyhow::Result<Option<Arc<dyn RemoteStore>>> {
    if !config.enabled {
        return Ok(None);
    }

    let remote: Arc<dyn RemoteStore> = match config.kind {
        RemoteKind::Firebase => Arc::new(
            FirebaseClient::new(
                &config.url,
                config.auth_token.clone(),
                Duration::from_secs(config.request_timeout_seconds),
                Duration::from_secs(config.poll_interval_seconds),
            )
            .map_err(|e| anyhow::anyhow!("Failed to build remote client: {e}"))?,
        ),
        RemoteKind::Memory => Arc::new(MemoryRemote::new()),
    };

    info!(remote = remote.name(), "Remote replica configured");
    Ok(Some(remote))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub storage: Arc<Storage>,

    pub services: Services,

    pub remote_sync: Arc<RemoteSync>,

    pub event_bus: broadcast::Sender<DeskEvent>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let remote = build_remote(&config.remote)?;
        Self::with_remote(config, remote).await
    }

    /// Wires every service over an explicit remote, which may be `None`.
    pub async fn with_remote(
        config: Config,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> anyhow::Result<Self> {
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size.max(1));

        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let storage = Arc::new(Storage::new(
            store.clone(),
            remote,
            &config.storage,
            event_bus.clone(),
        ));
        if storage.ensure_schema().await? {
            info!("Local store initialized for schema {}", crate::constants::keys::SCHEMA_VERSION);
        }

        let services = Services::new(&storage, &config.security, &config.ux);
        let remote_sync = Arc::new(RemoteSync::new(storage.clone()));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            storage,
            services,
            remote_sync,
            event_bus,
        })
    }

    pub async fn scheduler(&self) -> Scheduler {
        let config = self.config.read().await.scheduler.clone();
        Scheduler::new(
            self.storage.clone(),
            self.services.temp_passwords.clone(),
            config,
        )
    }
}
