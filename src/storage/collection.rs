use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// A whole-collection record set. Each collection is stored as a single blob
/// both locally (`bt_` prefixed key) and remotely (bare path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Users,
    GameStatus,
    Bugs,
    Suggestions,
    Notifications,
    Logs,
    AccountRequests,
    #[serde(rename = "websiteShutdown")]
    SiteStatus,
}

impl Collection {
    pub const ALL: [Self; 8] = [
        Self::Users,
        Self::GameStatus,
        Self::Bugs,
        Self::Suggestions,
        Self::Notifications,
        Self::Logs,
        Self::AccountRequests,
        Self::SiteStatus,
    ];

    /// Collections the remote listener keeps mirrored into the local cache.
    pub const WATCHED: [Self; 4] = [
        Self::Users,
        Self::AccountRequests,
        Self::Notifications,
        Self::GameStatus,
    ];

    #[must_use]
    pub const fn local_key(self) -> &'static str {
        match self {
            Self::Users => "bt_users",
            Self::GameStatus => "bt_gameStatus",
            Self::Bugs => "bt_bugs",
            Self::Suggestions => "bt_suggestions",
            Self::Notifications => "bt_notifications",
            Self::Logs => "bt_logs",
            Self::AccountRequests => "bt_accountRequests",
            Self::SiteStatus => "bt_websiteShutdown",
        }
    }

    #[must_use]
    pub const fn remote_path(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::GameStatus => "gameStatus",
            Self::Bugs => "bugs",
            Self::Suggestions => "suggestions",
            Self::Notifications => "notifications",
            Self::Logs => "logs",
            Self::AccountRequests => "accountRequests",
            Self::SiteStatus => "websiteShutdown",
        }
    }

    #[must_use]
    pub fn from_remote_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.remote_path() == path)
    }

    /// Value seeded into an empty local store.
    #[must_use]
    pub fn default_value(self) -> Value {
        match self {
            Self::GameStatus => json!({ "available": false, "link": "" }),
            Self::SiteStatus => json!({ "isShutdown": false, "reason": "" }),
            _ => json!([]),
        }
    }

    /// Testers are told about changes to what they can see; everything else
    /// is admin-only.
    #[must_use]
    pub const fn visible_to_testers(self) -> bool {
        matches!(self, Self::Notifications | Self::GameStatus | Self::SiteStatus)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.remote_path())
    }
}
