use serde::{Deserialize, Serialize};

use super::error::ServiceError;
use crate::models::{Role, User};

/// The authenticated caller of a service operation, resolved per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub username: String,
    pub role: Role,
    pub is_primary_admin: bool,
}

impl SessionContext {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::forbidden("Administrator access required"))
        }
    }
}

impl From<&User> for SessionContext {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role,
            is_primary_admin: user.is_main_admin,
        }
    }
}
