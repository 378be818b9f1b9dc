//! Setup command handler

use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_setup(
    config: &Config,
    username: &str,
    display_name: &str,
    password: &str,
) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;

    match state
        .services
        .accounts
        .setup_primary_admin(username, password, password, display_name)
        .await
    {
        Ok(user) => {
            println!("✓ Primary admin '{}' created.", user.username);
            println!("  Log in with this username to manage the beta.");
        }
        Err(e) => println!("Setup failed: {e}"),
    }

    Ok(())
}
