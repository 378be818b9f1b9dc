use std::sync::Arc;

use super::error::ServiceResult;
use super::session::SessionContext;
use crate::models::{AccountRequest, BugReport, LogEntry, Suggestion, User};
use crate::storage::{Collection, Storage};
use crate::views::dashboard::{DashboardView, dashboard};

pub struct DashboardService {
    storage: Arc<Storage>,
}

impl DashboardService {
    #[must_use]
    pub const fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn overview(&self, ctx: &SessionContext) -> ServiceResult<DashboardView> {
        ctx.require_admin()?;
        let users: Vec<User> = self.storage.load(Collection::Users).await?;
        let bugs: Vec<BugReport> = self.storage.load(Collection::Bugs).await?;
        let suggestions: Vec<Suggestion> = self.storage.load(Collection::Suggestions).await?;
        let requests: Vec<AccountRequest> = self.storage.load(Collection::AccountRequests).await?;
        let logs: Vec<LogEntry> = self.storage.load(Collection::Logs).await?;

        Ok(dashboard(&users, &bugs, &suggestions, &requests, &logs))
    }
}

#[cfg(test)]
mod tests {
    use super::super::bugs::NewBugReport;
    use super::*;
    use crate::models::Role;
    use crate::services::testing::{admin_ctx, ctx_for, harness, seed_users, tester};

    #[tokio::test]
    async fn test_overview_counts() {
        let h = harness().await;
        seed_users(&h, vec![tester("ana"), tester("ben")]).await;
        let ana = ctx_for(&tester("ana"));

        h.bugs
            .submit(
                &ana,
                NewBugReport {
                    severity: "low".into(),
                    title: "Typo".into(),
                    description: "Menu typo".into(),
                    steps: String::new(),
                },
            )
            .await
            .unwrap();
        h.accounts
            .create_account(&admin_ctx(), "cid", "Cid", Role::User)
            .await
            .unwrap();

        let view = h.dashboard.overview(&admin_ctx()).await.unwrap();
        assert_eq!(view.total_users, 3);
        assert_eq!(view.total_bugs, 1);
        assert_eq!(view.open_bugs, 1);
        assert_eq!(view.pending_requests, 0);
        assert_eq!(view.recent_activity.len(), 2);
        assert!(view.recent_activity[0].message.contains("cid"));

        assert!(h.dashboard.overview(&ana).await.is_err());
    }
}
