use std::sync::Arc;

use super::activity::ActivityLog;
use super::error::ServiceResult;
use super::latency::Latency;
use super::notifications::NotificationService;
use super::session::SessionContext;
use crate::models::{GameStatus, LogCategory, NotificationKind, SiteStatus};
use crate::storage::{Collection, Storage};

/// Build availability and the site maintenance switch.
pub struct StatusService {
    storage: Arc<Storage>,
    notifications: Arc<NotificationService>,
    activity: Arc<ActivityLog>,
    latency: Latency,
}

impl StatusService {
    #[must_use]
    pub const fn new(
        storage: Arc<Storage>,
        notifications: Arc<NotificationService>,
        activity: Arc<ActivityLog>,
        latency: Latency,
    ) -> Self {
        Self {
            storage,
            notifications,
            activity,
            latency,
        }
    }

    pub async fn game_status(&self) -> ServiceResult<GameStatus> {
        Ok(self.storage.load(Collection::GameStatus).await?)
    }

    /// Saves the status. Going from unavailable to available broadcasts a
    /// success notification to every tester.
    pub async fn update_game_status(
        &self,
        ctx: &SessionContext,
        available: bool,
        link: &str,
    ) -> ServiceResult<GameStatus> {
        ctx.require_admin()?;
        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let previous: GameStatus = self.storage.load(Collection::GameStatus).await?;
        let status = GameStatus {
            available,
            link: link.trim().to_string(),
        };
        self.storage.save(Collection::GameStatus, &status).await?;

        let label = if available { "available" } else { "unavailable" };
        self.activity
            .record(
                Some(&ctx.username),
                LogCategory::Game,
                format!("Game status changed to {label}"),
            )
            .await?;

        if available && !previous.available {
            self.notifications
                .broadcast(
                    NotificationKind::Success,
                    "Game Available!",
                    "The game is now available to play",
                )
                .await?;
        }

        Ok(status)
    }

    pub async fn site_status(&self) -> ServiceResult<SiteStatus> {
        Ok(self.storage.load(Collection::SiteStatus).await?)
    }

    pub async fn set_site_status(
        &self,
        ctx: &SessionContext,
        is_shutdown: bool,
        reason: &str,
    ) -> ServiceResult<SiteStatus> {
        ctx.require_admin()?;
        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let status = SiteStatus {
            is_shutdown,
            reason: if is_shutdown {
                reason.trim().to_string()
            } else {
                String::new()
            },
        };
        self.storage.save(Collection::SiteStatus, &status).await?;

        let message = if is_shutdown {
            format!("Site shut down: {}", status.reason)
        } else {
            "Site reopened".to_string()
        };
        self.activity
            .record(Some(&ctx.username), LogCategory::System, message)
            .await?;

        Ok(status)
    }
}
