use std::sync::Arc;

use super::activity::ActivityLog;
use super::error::{ServiceError, ServiceResult};
use super::latency::Latency;
use super::notifications::NotificationService;
use super::session::SessionContext;
use crate::clock::{display_timestamp, next_id};
use crate::models::{LogCategory, NotificationKind, Suggestion, SuggestionStatus};
use crate::storage::{Collection, Storage};

#[derive(Debug, Clone)]
pub struct NewSuggestion {
    pub category: String,
    pub title: String,
    pub description: String,
}

pub struct SuggestionService {
    storage: Arc<Storage>,
    notifications: Arc<NotificationService>,
    activity: Arc<ActivityLog>,
    latency: Latency,
}

impl SuggestionService {
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

    pub async fn submit(
        &self,
        ctx: &SessionContext,
        suggestion: NewSuggestion,
    ) -> ServiceResult<Suggestion> {
        let title = suggestion.title.trim();
        let description = suggestion.description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(ServiceError::validation("Title and description are required"));
        }
        let category = match suggestion.category.trim() {
            "" => "general".to_string(),
            other => other.to_ascii_lowercase(),
        };

        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let mut suggestions: Vec<Suggestion> = self.storage.load(Collection::Suggestions).await?;
        let created = Suggestion {
            id: next_id(suggestions.iter().map(|s| s.id)),
            author: ctx.username.clone(),
            category,
            title: title.to_string(),
            description: description.to_string(),
            timestamp: display_timestamp(),
            status: SuggestionStatus::Pending,
        };
        suggestions.insert(0, created.clone());
        self.storage
            .save(Collection::Suggestions, &suggestions)
            .await?;

        self.activity
            .record(
                Some(&ctx.username),
                LogCategory::Suggestion,
                format!("{} sent a suggestion: {title}", ctx.username),
            )
            .await?;
        self.notifications
            .notify_admins(
                NotificationKind::Info,
                "New Suggestion",
                &format!("{}: {title}", ctx.username),
            )
            .await?;

        Ok(created)
    }

    pub async fn mine(&self, ctx: &SessionContext) -> ServiceResult<Vec<Suggestion>> {
        let suggestions: Vec<Suggestion> = self.storage.load(Collection::Suggestions).await?;
        Ok(suggestions
            .into_iter()
            .filter(|s| s.author == ctx.username)
            .collect())
    }

    pub async fn all(&self, ctx: &SessionContext) -> ServiceResult<Vec<Suggestion>> {
        ctx.require_admin()?;
        Ok(self.storage.load(Collection::Suggestions).await?)
    }

    /// Accepts and tells the author.
    pub async fn accept(&self, ctx: &SessionContext, id: i64) -> ServiceResult<Suggestion> {
        let decided = self.decide(ctx, id, SuggestionStatus::Accepted).await?;
        Ok(decided)
    }

    /// Rejects silently; only the log records it.
    pub async fn reject(&self, ctx: &SessionContext, id: i64) -> ServiceResult<Suggestion> {
        self.decide(ctx, id, SuggestionStatus::Rejected).await
    }

    async fn decide(
        &self,
        ctx: &SessionContext,
        id: i64,
        outcome: SuggestionStatus,
    ) -> ServiceResult<Suggestion> {
        ctx.require_admin()?;
        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let mut suggestions: Vec<Suggestion> = self.storage.load(Collection::Suggestions).await?;
        let Some(suggestion) = suggestions.iter_mut().find(|s| s.id == id) else {
            return Err(ServiceError::not_found("Suggestion not found"));
        };
        if suggestion.status != SuggestionStatus::Pending {
            return Err(ServiceError::conflict("This suggestion was already decided"));
        }
        suggestion.status = outcome;
        let decided = suggestion.clone();
        self.storage
            .save(Collection::Suggestions, &suggestions)
            .await?;

        let verb = if outcome == SuggestionStatus::Accepted {
            self.notifications
                .notify(
                    &decided.author,
                    NotificationKind::Success,
                    "Suggestion Accepted",
                    &format!("Your suggestion \"{}\" has been accepted", decided.title),
                )
                .await?;
            "accepted"
        } else {
            "rejected"
        };

        self.activity
            .record(
                Some(&ctx.username),
                LogCategory::Suggestion,
                format!("Suggestion \"{}\" {verb}", decided.title),
            )
            .await?;

        Ok(decided)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{admin_ctx, ctx_for, harness, tester};

    fn idea(title: &str) -> NewSuggestion {
        NewSuggestion {
            category: "Gameplay".to_string(),
            title: title.to_string(),
            description: "Would be fun".to_string(),
        }
    }

    #[tokio::test]
    async fn test_accept_notifies_reject_does_not() {
        let h = harness().await;
        let ana = ctx_for(&tester("ana"));

        let sprint = h.suggestions.submit(&ana, idea("Sprint")).await.unwrap();
        let jetpack = h.suggestions.submit(&ana, idea("Jetpack")).await.unwrap();
        assert_eq!(sprint.category, "gameplay");

        h.suggestions.accept(&admin_ctx(), sprint.id).await.unwrap();
        assert_eq!(h.notifications.inbox(&ana).await.unwrap().len(), 1);

        let rejected = h.suggestions.reject(&admin_ctx(), jetpack.id).await.unwrap();
        assert_eq!(rejected.status, SuggestionStatus::Rejected);
        assert_eq!(h.notifications.inbox(&ana).await.unwrap().len(), 1);

        let logs = h.activity.recent(1).await.unwrap();
        assert!(logs[0].message.contains("rejected"));
    }

    #[tokio::test]
    async fn test_only_pending_can_be_decided() {
        let h = harness().await;
        let ana = ctx_for(&tester("ana"));
        let sprint = h.suggestions.submit(&ana, idea("Sprint")).await.unwrap();

        h.suggestions.reject(&admin_ctx(), sprint.id).await.unwrap();
        assert!(matches!(
            h.suggestions.accept(&admin_ctx(), sprint.id).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            h.suggestions.accept(&ana, sprint.id).await,
            Err(ServiceError::Forbidden(_))
        ));
    }
}
