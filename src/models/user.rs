use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique key; uniqueness is checked by scanning before insert.
    pub username: String,

    /// Argon2 PHC string or legacy checksum.
    pub password: String,

    /// Plaintext copy, only persisted when the deployment opts in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_password: Option<String>,

    pub role: Role,

    #[serde(alias = "robloxName")]
    pub display_name: String,

    #[serde(default, alias = "discord")]
    pub linked_handle: Option<String>,

    /// The primary admin may use 4-6 digit passwords and can only be
    /// edited or deleted by itself.
    #[serde(default)]
    pub is_main_admin: bool,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[must_use]
pub fn find<'a>(users: &'a [User], username: &str) -> Option<&'a User> {
    users.iter().find(|u| u.username == username)
}

#[must_use]
pub fn find_mut<'a>(users: &'a mut [User], username: &str) -> Option<&'a mut User> {
    users.iter_mut().find(|u| u.username == username)
}
