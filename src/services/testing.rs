//! Shared fixtures for service tests.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::{Services, SessionContext};
use crate::config::{SecurityConfig, StorageConfig, UxConfig};
use crate::db::Store;
use crate::models::{Role, User};
use crate::security::legacy_hash;
use crate::storage::{Collection, Storage};

pub struct Harness {
    pub storage: Arc<Storage>,
    pub services: Services,
}

impl std::ops::Deref for Harness {
    type Target = Services;

    fn deref(&self) -> &Self::Target {
        &self.services
    }
}

pub fn fast_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        ..SecurityConfig::default()
    }
}

pub async fn harness() -> Harness {
    harness_with_ux(&UxConfig::default()).await
}

pub async fn harness_with_ux(ux: &UxConfig) -> Harness {
    let store = Store::new("sqlite::memory:").await.unwrap();
    let (tx, _) = broadcast::channel(64);
    let storage = Arc::new(Storage::new(store, None, &StorageConfig::default(), tx));
    storage.ensure_schema().await.unwrap();

    let services = Services::new(&storage, &fast_security(), ux);
    Harness { storage, services }
}

/// Appends users directly, bypassing the account rules.
pub async fn seed_users(h: &Harness, users: Vec<User>) {
    let mut existing: Vec<User> = h.storage.load(Collection::Users).await.unwrap();
    existing.extend(users);
    h.storage.save(Collection::Users, &existing).await.unwrap();
}

fn account(name: &str, role: Role, is_main_admin: bool) -> User {
    User {
        username: name.to_string(),
        password: legacy_hash("1234"),
        plain_password: None,
        role,
        display_name: format!("{name}_rbx"),
        linked_handle: None,
        is_main_admin,
    }
}

/// Tester with password `1234`.
pub fn tester(name: &str) -> User {
    account(name, Role::User, false)
}

pub fn admin(name: &str) -> User {
    account(name, Role::Admin, false)
}

pub fn primary_admin(name: &str) -> User {
    account(name, Role::Admin, true)
}

pub fn ctx_for(user: &User) -> SessionContext {
    SessionContext::from(user)
}

/// A non-primary admin that does not need to exist in storage.
pub fn admin_ctx() -> SessionContext {
    ctx_for(&admin("overseer"))
}
