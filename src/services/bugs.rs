use std::sync::Arc;

use super::activity::ActivityLog;
use super::error::{ServiceError, ServiceResult};
use super::latency::Latency;
use super::notifications::NotificationService;
use super::session::SessionContext;
use crate::clock::{display_timestamp, next_id};
use crate::models::ticket::SEVERITIES;
use crate::models::{BugReport, BugStatus, LogCategory, NotificationKind};
use crate::storage::{Collection, Storage};

#[derive(Debug, Clone)]
pub struct NewBugReport {
    pub severity: String,
    pub title: String,
    pub description: String,
    pub steps: String,
}

pub struct BugService {
    storage: Arc<Storage>,
    notifications: Arc<NotificationService>,
    activity: Arc<ActivityLog>,
    latency: Latency,
}

impl BugService {
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
        report: NewBugReport,
    ) -> ServiceResult<BugReport> {
        let title = report.title.trim();
        let description = report.description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(ServiceError::validation("Title and description are required"));
        }

        let severity = report.severity.trim().to_ascii_lowercase();
        if !SEVERITIES.contains(&severity.as_str()) {
            return Err(ServiceError::validation(format!(
                "Severity must be one of: {}",
                SEVERITIES.join(", ")
            )));
        }

        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let mut bugs: Vec<BugReport> = self.storage.load(Collection::Bugs).await?;
        let bug = BugReport {
            id: next_id(bugs.iter().map(|b| b.id)),
            author: ctx.username.clone(),
            severity,
            title: title.to_string(),
            description: description.to_string(),
            steps: report.steps.trim().to_string(),
            timestamp: display_timestamp(),
            status: BugStatus::Open,
        };
        bugs.insert(0, bug.clone());
        self.storage.save(Collection::Bugs, &bugs).await?;

        self.activity
            .record(
                Some(&ctx.username),
                LogCategory::Bug,
                format!("{} reported a bug: {title}", ctx.username),
            )
            .await?;
        self.notifications
            .notify_admins(
                NotificationKind::Warning,
                "New Bug Reported",
                &format!("{}: {title}", ctx.username),
            )
            .await?;

        Ok(bug)
    }

    pub async fn mine(&self, ctx: &SessionContext) -> ServiceResult<Vec<BugReport>> {
        let bugs: Vec<BugReport> = self.storage.load(Collection::Bugs).await?;
        Ok(bugs
            .into_iter()
            .filter(|b| b.author == ctx.username)
            .collect())
    }

    pub async fn all(&self, ctx: &SessionContext) -> ServiceResult<Vec<BugReport>> {
        ctx.require_admin()?;
        Ok(self.storage.load(Collection::Bugs).await?)
    }

    /// Marks the bug fixed and tells its reporter.
    pub async fn mark_fixed(&self, ctx: &SessionContext, id: i64) -> ServiceResult<BugReport> {
        ctx.require_admin()?;
        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let mut bugs: Vec<BugReport> = self.storage.load(Collection::Bugs).await?;
        let Some(bug) = bugs.iter_mut().find(|b| b.id == id) else {
            return Err(ServiceError::not_found("Bug not found"));
        };
        if bug.status == BugStatus::Fixed {
            return Err(ServiceError::conflict("This bug is already marked as fixed"));
        }
        bug.status = BugStatus::Fixed;
        let fixed = bug.clone();
        self.storage.save(Collection::Bugs, &bugs).await?;

        self.notifications
            .notify(
                &fixed.author,
                NotificationKind::Success,
                "Bug Fixed",
                &format!("Your report \"{}\" has been marked as fixed", fixed.title),
            )
            .await?;
        self.activity
            .record(
                Some(&ctx.username),
                LogCategory::Bug,
                format!("Bug \"{}\" marked as fixed", fixed.title),
            )
            .await?;

        Ok(fixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{admin, admin_ctx, ctx_for, harness, seed_users, tester};

    fn report(title: &str) -> NewBugReport {
        NewBugReport {
            severity: "High".to_string(),
            title: title.to_string(),
            description: "Falls through the map".to_string(),
            steps: "1. Jump\n2. Fall".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_newest_first_and_notifies_admins() {
        let h = harness().await;
        seed_users(&h, vec![admin("boss"), tester("ana")]).await;
        let ana = ctx_for(&tester("ana"));

        h.bugs.submit(&ana, report("First")).await.unwrap();
        let second = h.bugs.submit(&ana, report("Second")).await.unwrap();
        assert_eq!(second.severity, "high");

        let all = h.bugs.all(&admin_ctx()).await.unwrap();
        assert_eq!(all[0].title, "Second");
        assert_eq!(all[1].title, "First");

        let boss = ctx_for(&admin("boss"));
        assert_eq!(h.notifications.inbox(&boss).await.unwrap().len(), 2);
        assert!(h.bugs.all(&ana).await.is_err());
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let h = harness().await;
        let ana = ctx_for(&tester("ana"));

        let mut untitled = report("");
        untitled.title = "   ".into();
        assert!(h.bugs.submit(&ana, untitled).await.is_err());

        let mut odd = report("Odd");
        odd.severity = "apocalyptic".into();
        assert!(matches!(
            h.bugs.submit(&ana, odd).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_mark_fixed_notifies_author() {
        let h = harness().await;
        seed_users(&h, vec![tester("ana"), tester("ben")]).await;
        let ana = ctx_for(&tester("ana"));
        let ben = ctx_for(&tester("ben"));

        let bug = h.bugs.submit(&ana, report("Crash")).await.unwrap();
        h.bugs.submit(&ben, report("Lag")).await.unwrap();
        assert_eq!(h.bugs.mine(&ana).await.unwrap().len(), 1);

        let fixed = h.bugs.mark_fixed(&admin_ctx(), bug.id).await.unwrap();
        assert_eq!(fixed.status, BugStatus::Fixed);
        assert!(matches!(
            h.bugs.mark_fixed(&admin_ctx(), bug.id).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            h.bugs.mark_fixed(&admin_ctx(), 7).await,
            Err(ServiceError::NotFound(_))
        ));

        let inbox = h.notifications.inbox(&ana).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert!(inbox[0].message.contains("Crash"));
        assert!(h.notifications.inbox(&ben).await.unwrap().is_empty());
    }
}
