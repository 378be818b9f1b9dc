//! Self-service account requests and their review by admins.

use std::sync::Arc;
use tracing::info;

use super::accounts::hash_secret;
use super::activity::ActivityLog;
use super::error::{ServiceError, ServiceResult};
use super::latency::Latency;
use super::notifications::NotificationService;
use super::session::SessionContext;
use crate::clock::{display_timestamp, next_id};
use crate::config::SecurityConfig;
use crate::constants::keys;
use crate::models::{
    AccountRequest, LogCategory, NotificationKind, RequestStatus, Role, User, user,
};
use crate::security::{PasswordHasherConfig, PasswordPolicy};
use crate::storage::{Collection, Storage};
use crate::views::requests::{RequestBoard, request_board};

#[derive(Debug, Clone)]
pub struct NewAccountRequest {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub reason: String,
}

pub struct RequestService {
    storage: Arc<Storage>,
    notifications: Arc<NotificationService>,
    activity: Arc<ActivityLog>,
    hasher: PasswordHasherConfig,
    retain_plaintext: bool,
    latency: Latency,
}

impl RequestService {
    #[must_use]
    pub fn new(
        storage: Arc<Storage>,
        notifications: Arc<NotificationService>,
        activity: Arc<ActivityLog>,
        security: &SecurityConfig,
        latency: Latency,
    ) -> Self {
        Self {
            storage,
            notifications,
            activity,
            hasher: PasswordHasherConfig::from(security),
            retain_plaintext: security.retain_plaintext_passwords,
            latency,
        }
    }

    /// Whether new requests are accepted. A missing flag counts as enabled.
    pub async fn enabled(&self) -> ServiceResult<bool> {
        Ok(self
            .storage
            .flag(keys::REQUESTS_ENABLED)
            .await?
            .is_none_or(|v| v == "true"))
    }

    pub async fn set_enabled(&self, ctx: &SessionContext, enabled: bool) -> ServiceResult<()> {
        ctx.require_admin()?;
        self.storage
            .set_flag(keys::REQUESTS_ENABLED, if enabled { "true" } else { "false" })
            .await?;
        info!(
            event = "requests_toggled",
            enabled,
            user = %ctx.username,
            "Account requests {}",
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    pub async fn submit(&self, request: NewAccountRequest) -> ServiceResult<AccountRequest> {
        if !self.enabled().await? {
            return Err(ServiceError::Disabled(
                "Account requests are temporarily disabled. Please try again later.".to_string(),
            ));
        }

        let username = request.username.trim();
        let display_name = request.display_name.trim();
        let reason = request.reason.trim();
        if username.is_empty()
            || request.password.is_empty()
            || display_name.is_empty()
            || reason.is_empty()
        {
            return Err(ServiceError::validation("All fields are required"));
        }

        let policy = PasswordPolicy::Standard;
        if !policy.accepts(&request.password) {
            return Err(ServiceError::validation(policy.requirement()));
        }

        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let users: Vec<User> = self.storage.load(Collection::Users).await?;
        if user::find(&users, username).is_some() {
            return Err(ServiceError::conflict("This username is already taken"));
        }

        let mut requests: Vec<AccountRequest> =
            self.storage.load(Collection::AccountRequests).await?;
        if requests
            .iter()
            .any(|r| r.username == username && r.is_pending())
        {
            return Err(ServiceError::conflict(
                "A pending request already exists for this username",
            ));
        }

        let created = AccountRequest {
            id: next_id(requests.iter().map(|r| r.id)),
            username: username.to_string(),
            password: hash_secret(&self.hasher, &request.password).await?,
            plain_password: self
                .retain_plaintext
                .then(|| request.password.clone()),
            display_name: display_name.to_string(),
            reason: reason.to_string(),
            status: RequestStatus::Pending,
            timestamp: display_timestamp(),
            accepted_at: None,
        };
        requests.push(created.clone());
        self.storage
            .save(Collection::AccountRequests, &requests)
            .await?;

        let notified = self
            .notifications
            .notify_admins(
                NotificationKind::Info,
                "New Account Request",
                &format!("{username} requested an account"),
            )
            .await?;

        info!(
            event = "account_requested",
            username,
            pending = requests.iter().filter(|r| r.is_pending()).count(),
            admins_notified = notified,
            "Account request stored"
        );
        Ok(created)
    }

    pub async fn board(&self, ctx: &SessionContext) -> ServiceResult<RequestBoard> {
        ctx.require_admin()?;
        let requests: Vec<AccountRequest> = self.storage.load(Collection::AccountRequests).await?;
        Ok(request_board(&requests))
    }

    /// Turns a pending request into exactly one tester account.
    pub async fn approve(&self, ctx: &SessionContext, id: i64) -> ServiceResult<User> {
        ctx.require_admin()?;
        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let mut requests: Vec<AccountRequest> =
            self.storage.load(Collection::AccountRequests).await?;
        let Some(request) = requests.iter_mut().find(|r| r.id == id) else {
            return Err(ServiceError::not_found("Request not found"));
        };
        if request.status == RequestStatus::Accepted {
            return Err(ServiceError::conflict("This request was already approved"));
        }

        let mut users: Vec<User> = self.storage.load(Collection::Users).await?;
        if user::find(&users, &request.username).is_some() {
            return Err(ServiceError::conflict(
                "An account with this username already exists",
            ));
        }

        let account = User {
            username: request.username.clone(),
            password: request.password.clone(),
            plain_password: request.plain_password.clone().filter(|_| self.retain_plaintext),
            role: Role::User,
            display_name: request.display_name.clone(),
            linked_handle: None,
            is_main_admin: false,
        };
        users.push(account.clone());
        self.storage.save(Collection::Users, &users).await?;

        self.notifications.backfill(&account.username).await?;

        request.status = RequestStatus::Accepted;
        request.accepted_at = Some(display_timestamp());
        request.plain_password = None;
        self.storage
            .save(Collection::AccountRequests, &requests)
            .await?;

        self.activity
            .record(
                Some(&ctx.username),
                LogCategory::Account,
                format!("Account request approved: {}", account.username),
            )
            .await?;

        Ok(account)
    }

    /// Removes the request without creating an account.
    pub async fn reject(&self, ctx: &SessionContext, id: i64) -> ServiceResult<()> {
        ctx.require_admin()?;
        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let mut requests: Vec<AccountRequest> =
            self.storage.load(Collection::AccountRequests).await?;
        let Some(index) = requests.iter().position(|r| r.id == id) else {
            return Err(ServiceError::not_found("Request not found"));
        };

        let removed = requests.remove(index);
        self.storage
            .save(Collection::AccountRequests, &requests)
            .await?;

        info!(
            event = "account_request_rejected",
            username = %removed.username,
            user = %ctx.username,
            "Account request rejected"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Notification;
    use crate::services::testing::{admin, admin_ctx, harness, seed_users, tester};

    fn new_request(username: &str) -> NewAccountRequest {
        NewAccountRequest {
            username: username.to_string(),
            password: "4321".to_string(),
            display_name: format!("{username}_rbx"),
            reason: "I want to test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_validations() {
        let h = harness().await;
        seed_users(&h, vec![tester("ana")]).await;

        let mut bad = new_request("zoe");
        bad.password = "12345".into();
        assert!(matches!(
            h.requests.submit(bad).await,
            Err(ServiceError::Validation(_))
        ));

        let mut blank = new_request("zoe");
        blank.reason = "  ".into();
        assert!(matches!(
            h.requests.submit(blank).await,
            Err(ServiceError::Validation(_))
        ));

        assert!(matches!(
            h.requests.submit(new_request("ana")).await,
            Err(ServiceError::Conflict(_))
        ));

        h.requests.submit(new_request("zoe")).await.unwrap();
        assert!(matches!(
            h.requests.submit(new_request("zoe")).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_disabled_requests_are_refused() {
        let h = harness().await;
        h.requests.set_enabled(&admin_ctx(), false).await.unwrap();
        assert!(!h.requests.enabled().await.unwrap());
        assert!(matches!(
            h.requests.submit(new_request("zoe")).await,
            Err(ServiceError::Disabled(_))
        ));
    }

    #[tokio::test]
    async fn test_ids_strictly_increase() {
        let h = harness().await;
        let a = h.requests.submit(new_request("a")).await.unwrap();
        let b = h.requests.submit(new_request("b")).await.unwrap();
        let c = h.requests.submit(new_request("c")).await.unwrap();
        assert!(a.id < b.id && b.id < c.id);
    }

    #[tokio::test]
    async fn test_submit_notifies_admins() {
        let h = harness().await;
        seed_users(&h, vec![admin("boss"), admin("chief"), tester("ana")]).await;
        h.requests.submit(new_request("zoe")).await.unwrap();

        let notifications: Vec<Notification> =
            h.storage.load(Collection::Notifications).await.unwrap();
        assert_eq!(notifications.len(), 2);
        assert!(notifications.iter().all(|n| n.recipient != "ana"));
    }

    #[tokio::test]
    async fn test_approve_creates_exactly_one_user() {
        let h = harness().await;
        let request = h.requests.submit(new_request("zoe")).await.unwrap();

        let user = h.requests.approve(&admin_ctx(), request.id).await.unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.display_name, "zoe_rbx");

        assert!(matches!(
            h.requests.approve(&admin_ctx(), request.id).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            h.requests.approve(&admin_ctx(), 42).await,
            Err(ServiceError::NotFound(_))
        ));

        let users: Vec<User> = h.storage.load(Collection::Users).await.unwrap();
        assert_eq!(users.iter().filter(|u| u.username == "zoe").count(), 1);
        assert!(h.accounts.login("zoe", "4321").await.is_ok());

        let board = h.requests.board(&admin_ctx()).await.unwrap();
        assert!(board.pending.is_empty());
        assert_eq!(board.recently_accepted.len(), 1);
    }

    #[tokio::test]
    async fn test_approve_collision_writes_nothing() {
        let h = harness().await;
        let request = h.requests.submit(new_request("zoe")).await.unwrap();
        seed_users(&h, vec![tester("zoe")]).await;

        assert!(matches!(
            h.requests.approve(&admin_ctx(), request.id).await,
            Err(ServiceError::Conflict(_))
        ));

        let requests: Vec<AccountRequest> =
            h.storage.load(Collection::AccountRequests).await.unwrap();
        assert!(requests[0].is_pending());
    }

    #[tokio::test]
    async fn test_reject_removes_request() {
        let h = harness().await;
        let request = h.requests.submit(new_request("zoe")).await.unwrap();

        h.requests.reject(&admin_ctx(), request.id).await.unwrap();
        assert!(matches!(
            h.requests.reject(&admin_ctx(), request.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(h.accounts.current("zoe").await.unwrap().is_none());
    }
}
