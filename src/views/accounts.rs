use serde::Serialize;

use crate::models::{Role, User};
use crate::services::SessionContext;

/// What the account list may show in place of a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordDisplay {
    /// A plaintext copy can be fetched from the reveal endpoint.
    Revealable,
    /// The primary admin's password, hidden from other admins.
    Protected,
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCard {
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub is_main_admin: bool,
    pub linked_handle: Option<String>,
    pub password: PasswordDisplay,
    pub can_edit: bool,
    pub can_delete: bool,
    pub is_self: bool,
}

/// One card per account, in stored order. `revealable` lists usernames
/// with a live temporary reveal.
#[must_use]
pub fn account_cards(users: &[User], ctx: &SessionContext, revealable: &[String]) -> Vec<AccountCard> {
    users
        .iter()
        .map(|user| {
            let is_self = user.username == ctx.username;
            let protected = user.is_main_admin && !is_self;
            let password = if protected {
                PasswordDisplay::Protected
            } else if user.plain_password.is_some() || revealable.contains(&user.username) {
                PasswordDisplay::Revealable
            } else {
                PasswordDisplay::Unavailable
            };

            AccountCard {
                username: user.username.clone(),
                display_name: user.display_name.clone(),
                role: user.role,
                is_main_admin: user.is_main_admin,
                linked_handle: user.linked_handle.clone(),
                password,
                can_edit: !protected,
                can_delete: !protected,
                is_self,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub is_main_admin: bool,
    pub linked_handle: Option<String>,
    pub handle_linked: bool,
}

#[must_use]
pub fn profile_view(user: &User) -> ProfileView {
    ProfileView {
        username: user.username.clone(),
        display_name: user.display_name.clone(),
        role: user.role,
        is_main_admin: user.is_main_admin,
        linked_handle: user.linked_handle.clone(),
        handle_linked: user.linked_handle.as_deref().is_some_and(|h| !h.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, role: Role, main: bool) -> User {
        User {
            username: name.to_string(),
            password: "x".to_string(),
            plain_password: None,
            role,
            display_name: name.to_uppercase(),
            linked_handle: None,
            is_main_admin: main,
        }
    }

    fn ctx(name: &str, main: bool) -> SessionContext {
        SessionContext {
            username: name.to_string(),
            role: Role::Admin,
            is_primary_admin: main,
        }
    }

    #[test]
    fn test_primary_admin_card_is_protected_from_others() {
        let users = vec![user("root", Role::Admin, true), user("ana", Role::User, false)];
        let cards = account_cards(&users, &ctx("boss", false), &["ana".to_string()]);

        assert_eq!(cards[0].password, PasswordDisplay::Protected);
        assert!(!cards[0].can_edit);
        assert!(!cards[0].can_delete);
        assert_eq!(cards[1].password, PasswordDisplay::Revealable);
        assert!(cards[1].can_edit);
    }

    #[test]
    fn test_primary_admin_sees_own_card() {
        let mut root = user("root", Role::Admin, true);
        root.plain_password = Some("123456".into());
        let cards = account_cards(&[root, user("ana", Role::User, false)], &ctx("root", true), &[]);

        assert!(cards[0].is_self);
        assert_eq!(cards[0].password, PasswordDisplay::Revealable);
        assert!(cards[0].can_edit);
        assert_eq!(cards[1].password, PasswordDisplay::Unavailable);
    }

    #[test]
    fn test_profile_handle_linked() {
        let mut ana = user("ana", Role::User, false);
        assert!(!profile_view(&ana).handle_linked);
        ana.linked_handle = Some(String::new());
        assert!(!profile_view(&ana).handle_linked);
        ana.linked_handle = Some("ana#1".into());
        assert!(profile_view(&ana).handle_linked);
    }
}
