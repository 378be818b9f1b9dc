//! Notification delivery and the broadcast backfill for new testers.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::activity::ActivityLog;
use super::error::{ServiceError, ServiceResult};
use super::latency::Latency;
use super::session::SessionContext;
use crate::clock::display_timestamp;
use crate::models::{LogCategory, Notification, NotificationKind, Role, User, user};
use crate::storage::{Collection, Storage};

/// Target of an admin-sent notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every account with the tester role.
    AllTesters,
    User(String),
}

impl Recipient {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "all" => Self::AllTesters,
            other => Self::User(other.to_string()),
        }
    }
}

pub struct NotificationService {
    storage: Arc<Storage>,
    activity: Arc<ActivityLog>,
    latency: Latency,
}

impl NotificationService {
    #[must_use]
    pub const fn new(storage: Arc<Storage>, activity: Arc<ActivityLog>, latency: Latency) -> Self {
        Self {
            storage,
            activity,
            latency,
        }
    }

    pub async fn send(
        &self,
        ctx: &SessionContext,
        recipient: Recipient,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> ServiceResult<usize> {
        ctx.require_admin()?;
        let title = title.trim();
        let message = message.trim();
        if title.is_empty() || message.is_empty() {
            return Err(ServiceError::validation("Title and message are required"));
        }

        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let delivered = match recipient {
            Recipient::AllTesters => self.broadcast(kind, title, message).await?,
            Recipient::User(username) => {
                let users: Vec<User> = self.storage.load(Collection::Users).await?;
                if user::find(&users, &username).is_none() {
                    return Err(ServiceError::not_found(format!(
                        "User '{username}' not found"
                    )));
                }
                self.notify(&username, kind, title, message).await?;
                1
            }
        };

        self.activity
            .record(
                Some(&ctx.username),
                LogCategory::Notification,
                format!("Notification sent: {title}"),
            )
            .await?;

        Ok(delivered)
    }

    /// Delivers one notification. Callers hold the mutation lock.
    pub async fn notify(
        &self,
        recipient: &str,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> ServiceResult<()> {
        let mut notifications: Vec<Notification> =
            self.storage.load(Collection::Notifications).await?;
        notifications.push(Notification {
            recipient: recipient.to_string(),
            kind,
            title: title.to_string(),
            message: message.to_string(),
            timestamp: display_timestamp(),
            read: false,
            is_global: false,
        });
        self.storage
            .save(Collection::Notifications, &notifications)
            .await?;
        Ok(())
    }

    /// Delivers to every admin. Callers hold the mutation lock.
    pub async fn notify_admins(
        &self,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> ServiceResult<usize> {
        let users: Vec<User> = self.storage.load(Collection::Users).await?;
        let admins: Vec<&User> = users.iter().filter(|u| u.role == Role::Admin).collect();

        if admins.is_empty() {
            info!(title, "No admins to notify");
            return Ok(0);
        }

        let mut notifications: Vec<Notification> =
            self.storage.load(Collection::Notifications).await?;
        let timestamp = display_timestamp();
        for admin in &admins {
            notifications.push(Notification {
                recipient: admin.username.clone(),
                kind,
                title: title.to_string(),
                message: message.to_string(),
                timestamp: timestamp.clone(),
                read: false,
                is_global: false,
            });
        }
        self.storage
            .save(Collection::Notifications, &notifications)
            .await?;
        Ok(admins.len())
    }

    /// One global copy per current tester. Callers hold the mutation lock.
    pub async fn broadcast(
        &self,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> ServiceResult<usize> {
        let users: Vec<User> = self.storage.load(Collection::Users).await?;
        let mut notifications: Vec<Notification> =
            self.storage.load(Collection::Notifications).await?;

        let timestamp = display_timestamp();
        let mut delivered = 0;
        for tester in users.iter().filter(|u| u.role == Role::User) {
            notifications.push(Notification {
                recipient: tester.username.clone(),
                kind,
                title: title.to_string(),
                message: message.to_string(),
                timestamp: timestamp.clone(),
                read: false,
                is_global: true,
            });
            delivered += 1;
        }

        self.storage
            .save(Collection::Notifications, &notifications)
            .await?;
        info!(title, delivered, "Broadcast delivered");
        Ok(delivered)
    }

    /// Gives `username` an unread copy of every distinct past broadcast it
    /// does not already hold. Callers hold the mutation lock.
    pub async fn backfill(&self, username: &str) -> ServiceResult<usize> {
        let mut notifications: Vec<Notification> =
            self.storage.load(Collection::Notifications).await?;

        let mut seen: HashSet<String> = notifications
            .iter()
            .filter(|n| n.is_global && n.recipient == username)
            .map(Notification::broadcast_key)
            .collect();

        let copies: Vec<Notification> = notifications
            .iter()
            .filter(|n| n.is_global)
            .filter(|n| seen.insert(n.broadcast_key()))
            .map(|n| Notification {
                recipient: username.to_string(),
                read: false,
                is_global: true,
                ..n.clone()
            })
            .collect();

        let added = copies.len();
        if added > 0 {
            notifications.extend(copies);
            self.storage
                .save(Collection::Notifications, &notifications)
                .await?;
        }
        Ok(added)
    }

    pub async fn inbox(&self, ctx: &SessionContext) -> ServiceResult<Vec<Notification>> {
        let notifications: Vec<Notification> =
            self.storage.load(Collection::Notifications).await?;
        Ok(notifications
            .into_iter()
            .filter(|n| n.recipient == ctx.username)
            .collect())
    }

    pub async fn mark_all_read(&self, ctx: &SessionContext) -> ServiceResult<usize> {
        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let mut notifications: Vec<Notification> =
            self.storage.load(Collection::Notifications).await?;
        let mut marked = 0;
        for n in notifications
            .iter_mut()
            .filter(|n| n.recipient == ctx.username && !n.read)
        {
            n.read = true;
            marked += 1;
        }

        if marked > 0 {
            self.storage
                .save(Collection::Notifications, &notifications)
                .await?;
        }
        Ok(marked)
    }

    pub async fn clear(&self, ctx: &SessionContext) -> ServiceResult<usize> {
        self.latency.pause().await;
        let _guard = self.storage.lock().await;

        let notifications: Vec<Notification> =
            self.storage.load(Collection::Notifications).await?;
        let before = notifications.len();
        let remaining: Vec<Notification> = notifications
            .into_iter()
            .filter(|n| n.recipient != ctx.username)
            .collect();
        let removed = before - remaining.len();

        self.storage
            .save(Collection::Notifications, &remaining)
            .await?;
        Ok(removed)
    }
}
