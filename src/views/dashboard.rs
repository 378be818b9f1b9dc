use serde::Serialize;

use crate::constants::limits;
use crate::models::{AccountRequest, BugReport, BugStatus, LogEntry, Suggestion, User};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub total_users: usize,
    pub total_bugs: usize,
    pub open_bugs: usize,
    pub total_suggestions: usize,
    pub pending_requests: usize,
    pub recent_activity: Vec<LogEntry>,
}

#[must_use]
pub fn dashboard(
    users: &[User],
    bugs: &[BugReport],
    suggestions: &[Suggestion],
    requests: &[AccountRequest],
    logs: &[LogEntry],
) -> DashboardView {
    DashboardView {
        total_users: users.len(),
        total_bugs: bugs.len(),
        open_bugs: bugs.iter().filter(|b| b.status == BugStatus::Open).count(),
        total_suggestions: suggestions.len(),
        pending_requests: requests.iter().filter(|r| r.is_pending()).count(),
        recent_activity: logs
            .iter()
            .take(limits::DASHBOARD_RECENT_LOGS)
            .cloned()
            .collect(),
    }
}
