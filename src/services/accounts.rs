//! Tester and admin accounts: setup, login, administration and self-service.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::activity::ActivityLog;
use super::error::{ServiceError, ServiceResult};
use super::latency::Latency;
use super::notifications::NotificationService;
use super::session::SessionContext;
use super::temp_passwords::TempPasswordCache;
use crate::config::SecurityConfig;
use crate::models::{LogCategory, Role, SiteStatus, User, user};
use crate::security::password::{generate_pin, needs_rehash};
use crate::security::{PasswordHasherConfig, PasswordPolicy, hash_password, verify_password};
use crate::storage::{Collection, Storage};
use crate::views::accounts::{AccountCard, ProfileView, account_cards, profile_view};

/// Hashes off the async runtime; argon2 is CPU bound.
pub(crate) async fn hash_secret(
    config: &PasswordHasherConfig,
    password: &str,
) -> ServiceResult<String> {
    let config = config.clone();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password, &config))
        .await?
        .map_err(|e| ServiceError::Internal(e.to_string()))
}

pub(crate) async fn verify_secret(password: &str, stored: &str) -> ServiceResult<bool> {
    let password = password.to_string();
    let stored = stored.to_string();
    Ok(tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await?)
}

/// Returned once when an admin creates an account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAccount {
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub new_password: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<Role>,
}

pub struct AccountService {
    storage: Arc<Storage>,
    notifications: Arc<NotificationService>,
    activity: Arc<ActivityLog>,
    temp_passwords: Arc<TempPasswordCache>,
    hasher: PasswordHasherConfig,
    auto_migrate_legacy: bool,
    retain_plaintext: bool,
    latency: Latency,
}

impl AccountService {
    #[must_use]
    pub fn new(
        storage: Arc<Storage>,
        notifications: Arc<NotificationService>,
        activity: Arc<ActivityLog>,
        temp_passwords: Arc<TempPasswordCache>,
        security: &SecurityConfig,
        latency: Latency,
    ) -> Self {
        Self {
            storage,
            notifications,
            activity,
            temp_passwords,
            hasher: PasswordHasherConfig::from(security),
            auto_migrate_legacy: security.auto_migrate_legacy_hashes,
            retain_plaintext: security.retain_plaintext_passwords,
            latency,
        }
    }

    fn plaintext_copy(&self, password: &str) -> Option<String> {
        self.retain_plaintext.then(|| password.to_string())
    }

    pub async fn needs_setup(&self) -> ServiceResult<bool> {
        let users: Vec<User> = self.storage.load(Collection::Users).await?;
        Ok(users.is_empty())
    }

    /// Creates the primary admin. Only allowed while no account exists.
    pub async fn setup_primary_admin(
        &self,
        username: &str,
        password: &str,
        confirm: &str,
        display_name: &str,
    ) -> ServiceResult<User> {
        let username = username.trim();
        let display_name = display_name.trim();
        if username.is_empty() || password.is_empty() || confirm.is_empty() || display_name.is_empty()
        {
            return Err(ServiceError::validation("All fields are required"));
        }

        let policy = PasswordPolicy::PrimaryAdmin;
        if !policy.accepts(password) {
            return Err(ServiceError::validation(policy.requirement()));
        }
        if password != confirm {
            return Err(ServiceError::validation("Passwords do not match"));
        }

        let _guard = self.storage.lock().await;
        let mut users: Vec<User> = self.storage.load(Collection::Users).await?;
        if !users.is_empty() {
            return Err(ServiceError::conflict("Initial setup has already been completed"));
        }

        let admin = User {
            username: username.to_string(),
            password: hash_secret(&self.hasher, password).await?,
            plain_password: self.plaintext_copy(password),
            role: Role::Admin,
            display_name: display_name.to_string(),
            linked_handle: None,
            is_main_admin: true,
        };
        users.push(admin.clone());
        self.storage.save(Collection::Users, &users).await?;

        self.activity
            .record(
                Some(username),
                LogCategory::Account,
                format!("Primary admin account created: {username}"),
            )
            .await?;

        info!(event = "setup_completed", username, "Primary admin created");
        Ok(admin)
    }

    /// Verifies credentials. While the site is shut down only admins get in.
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<User> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::validation("Username and password are required"));
        }

        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let mut users: Vec<User> = self.storage.load(Collection::Users).await?;
        let Some(found) = user::find_mut(&mut users, username.trim()) else {
            return Err(ServiceError::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        };

        if !verify_secret(password, &found.password).await? {
            return Err(ServiceError::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }

        if !found.is_admin() {
            let site: SiteStatus = self.storage.load(Collection::SiteStatus).await?;
            if site.is_shutdown {
                let reason = if site.reason.is_empty() {
                    "maintenance".to_string()
                } else {
                    site.reason
                };
                return Err(ServiceError::Disabled(format!(
                    "The site is currently shut down: {reason}"
                )));
            }
        }

        if self.auto_migrate_legacy && needs_rehash(&found.password, self.hasher.scheme) {
            found.password = hash_secret(&self.hasher, password).await?;
            if !self.retain_plaintext {
                found.plain_password = None;
            }
            let upgraded = found.clone();
            self.storage.save(Collection::Users, &users).await?;
            info!(username = %upgraded.username, "Upgraded stored password hash");
            self.record_login(&upgraded).await?;
            return Ok(upgraded);
        }

        let user = found.clone();
        self.record_login(&user).await?;
        Ok(user)
    }

    async fn record_login(&self, user: &User) -> ServiceResult<()> {
        self.activity
            .record(
                Some(&user.username),
                LogCategory::Login,
                format!("{} logged in", user.username),
            )
            .await
    }

    /// Resolves a session username to the live account, if it still exists.
    pub async fn current(&self, username: &str) -> ServiceResult<Option<User>> {
        let users: Vec<User> = self.storage.load(Collection::Users).await?;
        Ok(user::find(&users, username).cloned())
    }

    /// Creates an account with a random 4-digit password. The password is
    /// returned once and kept in the reveal cache for the TTL.
    pub async fn create_account(
        &self,
        ctx: &SessionContext,
        username: &str,
        display_name: &str,
        role: Role,
    ) -> ServiceResult<CreatedAccount> {
        ctx.require_admin()?;
        let username = username.trim();
        let display_name = display_name.trim();
        if username.is_empty() || display_name.is_empty() {
            return Err(ServiceError::validation("Username and display name are required"));
        }

        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let mut users: Vec<User> = self.storage.load(Collection::Users).await?;
        if user::find(&users, username).is_some() {
            return Err(ServiceError::conflict("This username already exists"));
        }

        let password = generate_pin();
        users.push(User {
            username: username.to_string(),
            password: hash_secret(&self.hasher, &password).await?,
            plain_password: self.plaintext_copy(&password),
            role,
            display_name: display_name.to_string(),
            linked_handle: None,
            is_main_admin: false,
        });
        self.storage.save(Collection::Users, &users).await?;
        self.temp_passwords.set(username, &password).await;

        if role == Role::User {
            self.notifications.backfill(username).await?;
        }

        self.activity
            .record(
                Some(&ctx.username),
                LogCategory::Account,
                format!("Account created: {username}"),
            )
            .await?;

        Ok(CreatedAccount {
            username: username.to_string(),
            display_name: display_name.to_string(),
            role,
            password,
        })
    }

    pub async fn list_accounts(&self, ctx: &SessionContext) -> ServiceResult<Vec<AccountCard>> {
        ctx.require_admin()?;
        let users: Vec<User> = self.storage.load(Collection::Users).await?;

        let mut revealable = Vec::new();
        for u in &users {
            if self.temp_passwords.get(&u.username).await.is_some() {
                revealable.push(u.username.clone());
            }
        }

        Ok(account_cards(&users, ctx, &revealable))
    }

    /// Edits another account. The primary admin can only be edited by itself
    /// and never loses the admin role.
    pub async fn update_account(
        &self,
        ctx: &SessionContext,
        target: &str,
        update: AccountUpdate,
    ) -> ServiceResult<User> {
        ctx.require_admin()?;

        let new_password = update.new_password.filter(|p| !p.is_empty());
        let display_name = update
            .display_name
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let mut users: Vec<User> = self.storage.load(Collection::Users).await?;
        let Some(account) = user::find_mut(&mut users, target) else {
            return Err(ServiceError::not_found(format!("User '{target}' not found")));
        };

        if account.is_main_admin && ctx.username != account.username {
            return Err(ServiceError::forbidden(
                "Only the primary admin can edit the primary admin account",
            ));
        }
        if account.is_main_admin && update.role == Some(Role::User) {
            return Err(ServiceError::validation("The primary admin cannot be demoted"));
        }

        if let Some(password) = &new_password {
            let policy = PasswordPolicy::for_account(account.is_main_admin);
            if !policy.accepts(password) {
                return Err(ServiceError::validation(policy.requirement()));
            }
            account.password = hash_secret(&self.hasher, password).await?;
            account.plain_password = self.plaintext_copy(password);
        }
        if let Some(display_name) = display_name {
            account.display_name = display_name;
        }
        if let Some(role) = update.role {
            account.role = role;
        }

        let updated = account.clone();
        self.storage.save(Collection::Users, &users).await?;

        if let Some(password) = &new_password {
            self.temp_passwords.set(&updated.username, password).await;
        }

        self.activity
            .record(
                Some(&ctx.username),
                LogCategory::Account,
                format!("Account updated: {target}"),
            )
            .await?;

        Ok(updated)
    }

    pub async fn delete_account(&self, ctx: &SessionContext, target: &str) -> ServiceResult<()> {
        ctx.require_admin()?;
        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let mut users: Vec<User> = self.storage.load(Collection::Users).await?;
        let Some(index) = users.iter().position(|u| u.username == target) else {
            return Err(ServiceError::not_found(format!("User '{target}' not found")));
        };

        if users[index].is_main_admin && ctx.username != target {
            return Err(ServiceError::forbidden(
                "Only the primary admin can delete the primary admin account",
            ));
        }

        users.remove(index);
        self.storage.save(Collection::Users, &users).await?;
        self.temp_passwords.remove(target).await;

        self.activity
            .record(
                Some(&ctx.username),
                LogCategory::Account,
                format!("Account deleted: {target}"),
            )
            .await?;

        Ok(())
    }

    /// Plaintext password when retained or still inside the reveal window.
    pub async fn reveal_password(
        &self,
        ctx: &SessionContext,
        target: &str,
    ) -> ServiceResult<Option<String>> {
        ctx.require_admin()?;
        let users: Vec<User> = self.storage.load(Collection::Users).await?;
        let Some(account) = user::find(&users, target) else {
            return Err(ServiceError::not_found(format!("User '{target}' not found")));
        };

        if account.is_main_admin && ctx.username != account.username {
            return Err(ServiceError::forbidden(
                "The primary admin password is protected",
            ));
        }

        if let Some(plain) = &account.plain_password {
            return Ok(Some(plain.clone()));
        }
        Ok(self.temp_passwords.get(target).await)
    }

    pub async fn change_password(
        &self,
        ctx: &SessionContext,
        current: &str,
        new_password: &str,
        confirm: &str,
    ) -> ServiceResult<()> {
        if current.is_empty() || new_password.is_empty() || confirm.is_empty() {
            return Err(ServiceError::validation("All fields are required"));
        }

        let policy = PasswordPolicy::for_account(ctx.is_primary_admin);
        if !policy.accepts(new_password) {
            return Err(ServiceError::validation(policy.requirement()));
        }
        if new_password != confirm {
            return Err(ServiceError::validation("Passwords do not match"));
        }

        self.latency.pause().await;
        let _guard = self.storage.lock().await;
        let mut users: Vec<User> = self.storage.load(Collection::Users).await?;
        let Some(account) = user::find_mut(&mut users, &ctx.username) else {
            return Err(ServiceError::not_found("Account not found"));
        };

        if !verify_secret(current, &account.password).await? {
            return Err(ServiceError::validation("Current password is incorrect"));
        }

        account.password = hash_secret(&self.hasher, new_password).await?;
        account.plain_password = self.plaintext_copy(new_password);
        self.storage.save(Collection::Users, &users).await?;
        self.temp_passwords.set(&ctx.username, new_password).await;

        info!(event = "password_changed", username = %ctx.username, "Password changed");
        Ok(())
    }

    /// Links an external chat handle to the caller's account.
    pub async fn link_handle(&self, ctx: &SessionContext, handle: &str) -> ServiceResult<User> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(ServiceError::validation("A handle is required"));
        }

        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let mut users: Vec<User> = self.storage.load(Collection::Users).await?;
        let Some(account) = user::find_mut(&mut users, &ctx.username) else {
            warn!(username = %ctx.username, "Handle link for missing account");
            return Err(ServiceError::not_found("Account not found"));
        };
        account.linked_handle = Some(handle.to_string());
        let updated = account.clone();

        self.storage.save(Collection::Users, &users).await?;
        Ok(updated)
    }

    pub async fn profile(&self, ctx: &SessionContext) -> ServiceResult<ProfileView> {
        let users: Vec<User> = self.storage.load(Collection::Users).await?;
        user::find(&users, &ctx.username)
            .map(profile_view)
            .ok_or_else(|| ServiceError::not_found("Account not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UxConfig;
    use crate::models::Notification;
    use crate::security::legacy_hash;
    use crate::services::testing::{
        admin, admin_ctx, ctx_for, harness, harness_with_ux, primary_admin, seed_users, tester,
    };

    #[tokio::test]
    async fn test_setup_only_once() {
        let h = harness().await;
        assert!(h.accounts.needs_setup().await.unwrap());

        let err = h
            .accounts
            .setup_primary_admin("root", "123", "123", "Root")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = h
            .accounts
            .setup_primary_admin("root", "123456", "654321", "Root")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let root = h
            .accounts
            .setup_primary_admin("root", "123456", "123456", "Root")
            .await
            .unwrap();
        assert!(root.is_main_admin);
        assert_eq!(root.role, Role::Admin);
        assert!(!h.accounts.needs_setup().await.unwrap());

        let err = h
            .accounts
            .setup_primary_admin("other", "1234", "1234", "Other")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_upgrades_legacy_hash() {
        let h = harness().await;
        seed_users(&h, vec![tester("ana")]).await;

        let err = h.accounts.login("ana", "9999").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let user = h.accounts.login("ana", "1234").await.unwrap();
        assert!(user.password.starts_with("$argon2"));
        assert!(user.plain_password.is_none());

        let again = h.accounts.login("ana", "1234").await.unwrap();
        assert_eq!(again.username, "ana");

        let logs = h.activity.recent(5).await.unwrap();
        assert_eq!(logs[0].category, LogCategory::Login);
    }

    #[tokio::test]
    async fn test_shutdown_blocks_testers_only() {
        let h = harness().await;
        seed_users(&h, vec![tester("ana"), admin("boss")]).await;
        h.status
            .set_site_status(&admin_ctx(), true, "Upgrading servers")
            .await
            .unwrap();

        let err = h.accounts.login("ana", "1234").await.unwrap_err();
        assert!(matches!(err, ServiceError::Disabled(msg) if msg.contains("Upgrading servers")));
        assert!(h.accounts.login("boss", "1234").await.is_ok());
    }

    #[tokio::test]
    async fn test_create_account_backfills_broadcasts() {
        let h = harness().await;
        seed_users(&h, vec![tester("ana")]).await;
        h.status
            .update_game_status(&admin_ctx(), true, "https://play")
            .await
            .unwrap();

        let created = h
            .accounts
            .create_account(&admin_ctx(), "ben", "Ben", Role::User)
            .await
            .unwrap();
        assert!(PasswordPolicy::Standard.accepts(&created.password));

        let err = h
            .accounts
            .create_account(&admin_ctx(), "ben", "Ben again", Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let notifications: Vec<Notification> =
            h.storage.load(Collection::Notifications).await.unwrap();
        assert_eq!(
            notifications.iter().filter(|n| n.recipient == "ben").count(),
            1
        );

        assert_eq!(
            h.accounts
                .reveal_password(&admin_ctx(), "ben")
                .await
                .unwrap()
                .as_deref(),
            Some(created.password.as_str())
        );

        let user = h.accounts.login("ben", &created.password).await.unwrap();
        assert_eq!(user.display_name, "Ben");
    }

    #[tokio::test]
    async fn test_primary_admin_protection() {
        let h = harness().await;
        seed_users(&h, vec![primary_admin("root"), admin("boss")]).await;
        let boss = ctx_for(&admin("boss"));
        let root = ctx_for(&primary_admin("root"));

        let err = h
            .accounts
            .update_account(
                &boss,
                "root",
                AccountUpdate {
                    display_name: Some("Hacked".into()),
                    ..AccountUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        assert!(matches!(
            h.accounts.delete_account(&boss, "root").await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            h.accounts.reveal_password(&boss, "root").await,
            Err(ServiceError::Forbidden(_))
        ));

        let err = h
            .accounts
            .update_account(
                &root,
                "root",
                AccountUpdate {
                    role: Some(Role::User),
                    ..AccountUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let updated = h
            .accounts
            .update_account(
                &root,
                "root",
                AccountUpdate {
                    new_password: Some("123456".into()),
                    ..AccountUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(verify_password("123456", &updated.password));
    }

    #[tokio::test]
    async fn test_update_enforces_target_policy() {
        let h = harness().await;
        seed_users(&h, vec![tester("ana")]).await;

        let err = h
            .accounts
            .update_account(
                &admin_ctx(),
                "ana",
                AccountUpdate {
                    new_password: Some("123456".into()),
                    ..AccountUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert!(matches!(
            h.accounts
                .update_account(&admin_ctx(), "ghost", AccountUpdate::default())
                .await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_drops_reveal() {
        let h = harness().await;
        let created = h
            .accounts
            .create_account(&admin_ctx(), "ana", "Ana", Role::User)
            .await
            .unwrap();
        assert!(!created.password.is_empty());

        h.accounts.delete_account(&admin_ctx(), "ana").await.unwrap();
        assert!(h.temp_passwords.get("ana").await.is_none());
        assert!(h.accounts.current("ana").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_change_password_flow() {
        let h = harness().await;
        seed_users(&h, vec![tester("ana")]).await;
        let ana = ctx_for(&tester("ana"));

        assert!(matches!(
            h.accounts.change_password(&ana, "1234", "5678", "8765").await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            h.accounts.change_password(&ana, "0000", "5678", "5678").await,
            Err(ServiceError::Validation(_))
        ));

        h.accounts
            .change_password(&ana, "1234", "5678", "5678")
            .await
            .unwrap();
        assert!(h.accounts.login("ana", "5678").await.is_ok());
        assert!(h.accounts.login("ana", "1234").await.is_err());
        assert_ne!(legacy_hash("5678"), h.accounts.current("ana").await.unwrap().unwrap().password);
    }

    #[tokio::test]
    async fn test_change_password_pauses_before_locking() {
        let h = harness_with_ux(&UxConfig {
            min_delay_ms: 400,
            max_delay_ms: 400,
        })
        .await;
        seed_users(&h, vec![tester("ana")]).await;
        let ana = ctx_for(&tester("ana"));

        let accounts = h.accounts.clone();
        let task = tokio::spawn(async move {
            accounts.change_password(&ana, "1234", "5678", "5678").await
        });

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let guard =
            tokio::time::timeout(std::time::Duration::from_millis(100), h.storage.lock()).await;
        assert!(guard.is_ok());
        drop(guard);

        task.await.unwrap().unwrap();
        assert!(h.accounts.login("ana", "5678").await.is_ok());
    }

    #[tokio::test]
    async fn test_link_handle_and_profile() {
        let h = harness().await;
        seed_users(&h, vec![tester("ana")]).await;
        let ana = ctx_for(&tester("ana"));

        assert!(h.accounts.link_handle(&ana, "  ").await.is_err());
        let user = h.accounts.link_handle(&ana, "ana#0001").await.unwrap();
        assert_eq!(user.linked_handle.as_deref(), Some("ana#0001"));

        let profile = h.accounts.profile(&ana).await.unwrap();
        assert!(profile.handle_linked);
    }
}
