use serde::{Deserialize, Serialize};

/// Whether the current beta build can be played, and where.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    pub available: bool,
    #[serde(default)]
    pub link: String,
}

/// Maintenance switch. While shut down only admins can log in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatus {
    pub is_shutdown: bool,
    #[serde(default)]
    pub reason: String,
}
