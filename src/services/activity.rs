use std::sync::Arc;
use tracing::info;

use super::error::ServiceResult;
use super::session::SessionContext;
use crate::clock::display_timestamp;
use crate::constants::{SYSTEM_ACTOR, limits};
use crate::models::{LogCategory, LogEntry};
use crate::storage::{Collection, Storage};

/// Append-only activity log, newest first and capped.
pub struct ActivityLog {
    storage: Arc<Storage>,
}

impl ActivityLog {
    #[must_use]
    pub const fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Prepends an entry, evicting the oldest past the cap.
    /// Callers hold the mutation lock.
    pub async fn record(
        &self,
        actor: Option<&str>,
        category: LogCategory,
        message: impl Into<String>,
    ) -> ServiceResult<()> {
        let message = message.into();
        let user = actor.unwrap_or(SYSTEM_ACTOR).to_string();
        info!(event = "activity", category = %category, user = %user, "{}", message);

        let mut logs: Vec<LogEntry> = self.storage.load(Collection::Logs).await?;
        logs.insert(
            0,
            LogEntry {
                category,
                message,
                user,
                timestamp: display_timestamp(),
            },
        );
        logs.truncate(limits::MAX_LOG_ENTRIES);

        self.storage.save(Collection::Logs, &logs).await?;
        Ok(())
    }

    pub async fn list(
        &self,
        ctx: &SessionContext,
        category: Option<LogCategory>,
    ) -> ServiceResult<Vec<LogEntry>> {
        ctx.require_admin()?;
        let logs: Vec<LogEntry> = self.storage.load(Collection::Logs).await?;
        Ok(filter_by_category(logs, category))
    }

    /// Account-category entries, readable without a session.
    pub async fn public_account_log(&self) -> ServiceResult<Vec<LogEntry>> {
        let logs: Vec<LogEntry> = self.storage.load(Collection::Logs).await?;
        Ok(filter_by_category(logs, Some(LogCategory::Account)))
    }

    pub async fn recent(&self, count: usize) -> ServiceResult<Vec<LogEntry>> {
        let mut logs: Vec<LogEntry> = self.storage.load(Collection::Logs).await?;
        logs.truncate(count);
        Ok(logs)
    }

    pub async fn clear(&self, ctx: &SessionContext) -> ServiceResult<()> {
        ctx.require_admin()?;
        let _guard = self.storage.lock().await;
        self.storage
            .save(Collection::Logs, &Vec::<LogEntry>::new())
            .await?;
        info!(event = "logs_cleared", user = %ctx.username, "Activity log cleared");
        Ok(())
    }
}

fn filter_by_category(logs: Vec<LogEntry>, category: Option<LogCategory>) -> Vec<LogEntry> {
    match category {
        Some(category) => logs.into_iter().filter(|l| l.category == category).collect(),
        None => logs,
    }
}
