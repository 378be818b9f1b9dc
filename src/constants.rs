pub mod keys {
    /// Current local schema marker. Any other stored value wipes the local store.
    pub const SCHEMA_VERSION: &str = "2.0";

    pub const VERSION: &str = "bt_version";

    pub const LAST_USERNAME: &str = "bt_last_username";

    pub const REQUESTS_ENABLED: &str = "bt_accountRequestsEnabled";
}

pub mod limits {

    /// Activity log cap; the oldest entry is evicted first.
    pub const MAX_LOG_ENTRIES: usize = 100;

    pub const DASHBOARD_RECENT_LOGS: usize = 5;

    pub const RECENTLY_ACCEPTED_REQUESTS: usize = 2;
}

pub mod session {

    pub const USER_KEY: &str = "user";

    pub const LAST_USERNAME_COOKIE: &str = "bt_last_username";

    pub const LAST_USERNAME_COOKIE_DAYS: i64 = 365;
}

/// Actor name recorded for log entries written without a session.
pub const SYSTEM_ACTOR: &str = "System";

/// Display format for record timestamps, e.g. `16/10/2026, 14:05:09`.
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%-d/%-m/%Y, %-H:%M:%S";
