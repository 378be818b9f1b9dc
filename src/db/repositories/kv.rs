use crate::entities::{kv_entries, prelude::*};
use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set};

pub struct KvRepository {
    conn: DatabaseConnection,
}

impl KvRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = KvEntries::find_by_id(key.to_string())
            .one(&self.conn)
            .await
            .with_context(|| format!("Failed to read key {key}"))?;

        Ok(entry.map(|e| e.value))
    }

    /// Inserts or replaces the value stored under `key`.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let active_model = kv_entries::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        KvEntries::insert(active_model)
            .on_conflict(
                OnConflict::column(kv_entries::Column::Key)
                    .update_columns([kv_entries::Column::Value, kv_entries::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .with_context(|| format!("Failed to write key {key}"))?;

        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        let result = KvEntries::delete_by_id(key.to_string())
            .exec(&self.conn)
            .await
            .with_context(|| format!("Failed to delete key {key}"))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        let keys = KvEntries::find()
            .select_only()
            .column(kv_entries::Column::Key)
            .order_by_asc(kv_entries::Column::Key)
            .into_tuple::<String>()
            .all(&self.conn)
            .await
            .context("Failed to list keys")?;

        Ok(keys)
    }

    pub async fn clear(&self) -> Result<u64> {
        let result = KvEntries::delete_many()
            .exec(&self.conn)
            .await
            .context("Failed to clear local store")?;

        Ok(result.rows_affected)
    }
}
