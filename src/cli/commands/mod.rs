mod login;
mod logs;
mod requests;
mod reset;
mod setup;
mod users;

pub use login::cmd_login;
pub use logs::cmd_logs;
pub use requests::cmd_requests;
pub use reset::cmd_reset_local;
pub use setup::cmd_setup;
pub use users::cmd_users;

use crate::constants::SYSTEM_ACTOR;
use crate::models::Role;
use crate::services::SessionContext;

/// Whoever runs the CLI already has the database file, so commands act
/// with admin rights.
fn operator() -> SessionContext {
    SessionContext {
        username: SYSTEM_ACTOR.to_string(),
        role: Role::Admin,
        is_primary_admin: false,
    }
}
