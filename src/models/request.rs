use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
}

/// Self-service request for a tester account, resolved by an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRequest {
    /// Creation timestamp in milliseconds.
    pub id: i64,
    pub username: String,
    /// Hash of the requested password, copied to the user on approval.
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_password: Option<String>,
    #[serde(alias = "robloxName")]
    pub display_name: String,
    pub reason: String,
    pub status: RequestStatus,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<String>,
}

impl AccountRequest {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}
