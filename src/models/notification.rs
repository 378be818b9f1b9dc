use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// One delivered notification. Broadcasts are materialized as one record per
/// recipient and flagged `is_global`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub recipient: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub is_global: bool,
}

impl Notification {
    /// Identity of a broadcast across its per-recipient copies.
    #[must_use]
    pub fn broadcast_key(&self) -> String {
        format!("{}-{}-{}", self.title, self.message, self.timestamp)
    }
}
