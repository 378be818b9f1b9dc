pub mod accounts;
pub mod activity;
pub mod bugs;
pub mod dashboard;
pub mod error;
pub mod latency;
pub mod notifications;
pub mod requests;
pub mod scheduler;
pub mod session;
pub mod status;
pub mod suggestions;
pub mod sync;
pub mod temp_passwords;

#[cfg(test)]
pub(crate) mod testing;

pub use accounts::{AccountService, AccountUpdate, CreatedAccount};
pub use activity::ActivityLog;
pub use bugs::{BugService, NewBugReport};
pub use dashboard::DashboardService;
pub use error::{ServiceError, ServiceResult};
pub use latency::Latency;
pub use notifications::{NotificationService, Recipient};
pub use requests::{NewAccountRequest, RequestService};
pub use scheduler::Scheduler;
pub use session::SessionContext;
pub use status::StatusService;
pub use suggestions::{NewSuggestion, SuggestionService};
pub use sync::RemoteSync;
pub use temp_passwords::TempPasswordCache;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{SecurityConfig, UxConfig};
use crate::storage::Storage;

/// Every feature service, wired over one storage wrapper.
#[derive(Clone)]
pub struct Services {
    pub activity: Arc<ActivityLog>,
    pub notifications: Arc<NotificationService>,
    pub accounts: Arc<AccountService>,
    pub requests: Arc<RequestService>,
    pub bugs: Arc<BugService>,
    pub suggestions: Arc<SuggestionService>,
    pub status: Arc<StatusService>,
    pub dashboard: Arc<DashboardService>,
    pub temp_passwords: Arc<TempPasswordCache>,
}

impl Services {
    #[must_use]
    pub fn new(storage: &Arc<Storage>, security: &SecurityConfig, ux: &UxConfig) -> Self {
        let latency = Latency::from(ux);
        let temp_passwords = Arc::new(TempPasswordCache::new(Duration::from_secs(
            security.temp_password_ttl_minutes * 60,
        )));

        let activity = Arc::new(ActivityLog::new(storage.clone()));
        let notifications = Arc::new(NotificationService::new(
            storage.clone(),
            activity.clone(),
            latency,
        ));

        Self {
            accounts: Arc::new(AccountService::new(
                storage.clone(),
                notifications.clone(),
                activity.clone(),
                temp_passwords.clone(),
                security,
                latency,
            )),
            requests: Arc::new(RequestService::new(
                storage.clone(),
                notifications.clone(),
                activity.clone(),
                security,
                latency,
            )),
            bugs: Arc::new(BugService::new(
                storage.clone(),
                notifications.clone(),
                activity.clone(),
                latency,
            )),
            suggestions: Arc::new(SuggestionService::new(
                storage.clone(),
                notifications.clone(),
                activity.clone(),
                latency,
            )),
            status: Arc::new(StatusService::new(
                storage.clone(),
                notifications.clone(),
                activity.clone(),
                latency,
            )),
            dashboard: Arc::new(DashboardService::new(storage.clone())),
            activity,
            notifications,
            temp_passwords,
        }
    }
}
