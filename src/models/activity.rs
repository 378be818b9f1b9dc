use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    Login,
    Account,
    Game,
    Bug,
    Suggestion,
    Notification,
    System,
}

impl LogCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Account => "account",
            Self::Game => "game",
            Self::Bug => "bug",
            Self::Suggestion => "suggestion",
            Self::Notification => "notification",
            Self::System => "system",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "login" => Ok(Self::Login),
            "account" => Ok(Self::Account),
            "game" => Ok(Self::Game),
            "bug" => Ok(Self::Bug),
            "suggestion" => Ok(Self::Suggestion),
            "notification" => Ok(Self::Notification),
            "system" => Ok(Self::System),
            other => Err(format!("Unknown log category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub category: LogCategory,
    pub message: String,
    /// Username of the actor, or the system actor name.
    pub user: String,
    pub timestamp: String,
}
