use serde::Serialize;

use crate::models::Notification;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxView {
    pub unread: usize,
    /// Newest first.
    pub notifications: Vec<Notification>,
}

#[must_use]
pub fn inbox(mut notifications: Vec<Notification>) -> InboxView {
    notifications.reverse();
    InboxView {
        unread: notifications.iter().filter(|n| !n.read).count(),
        notifications,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;

    #[test]
    fn test_unread_count_and_order() {
        let make = |title: &str, read: bool| Notification {
            recipient: "ana".into(),
            kind: NotificationKind::Info,
            title: title.into(),
            message: String::new(),
            timestamp: String::new(),
            read,
            is_global: false,
        };

        let view = inbox(vec![make("old", true), make("new", false)]);
        assert_eq!(view.unread, 1);
        assert_eq!(view.notifications[0].title, "new");
    }
}
