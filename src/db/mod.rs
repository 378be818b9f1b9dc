use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

/// Local key/value store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if in_memory {
            // Every pooled connection to `:memory:` would otherwise see its own database.
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(max_connections)
                .min_connections(min_connections)
                .idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn kv_repo(&self) -> repositories::kv::KvRepository {
        repositories::kv::KvRepository::new(self.conn.clone())
    }

    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        self.kv_repo().get(key).await
    }

    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.kv_repo().set(key, value).await
    }

    pub async fn delete_value(&self, key: &str) -> Result<bool> {
        self.kv_repo().delete(key).await
    }

    pub async fn list_keys(&self) -> Result<Vec<String>> {
        self.kv_repo().keys().await
    }

    pub async fn clear_values(&self) -> Result<u64> {
        self.kv_repo().clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_overwrite_delete() {
        let store = Store::new("sqlite::memory:").await.unwrap();

        assert_eq!(store.get_value("bt_users").await.unwrap(), None);

        store.set_value("bt_users", "first").await.unwrap();
        store.set_value("bt_users", "second").await.unwrap();
        assert_eq!(
            store.get_value("bt_users").await.unwrap().as_deref(),
            Some("second")
        );

        assert!(store.delete_value("bt_users").await.unwrap());
        assert!(!store.delete_value("bt_users").await.unwrap());
        assert_eq!(store.get_value("bt_users").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_removes_every_key() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.set_value("bt_bugs", "[]").await.unwrap();
        store.set_value("bt_logs", "[]").await.unwrap();

        assert_eq!(store.list_keys().await.unwrap(), vec!["bt_bugs", "bt_logs"]);
        assert_eq!(store.clear_values().await.unwrap(), 2);
        assert!(store.list_keys().await.unwrap().is_empty());
    }
}
