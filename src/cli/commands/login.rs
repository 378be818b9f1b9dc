//! Login command handler

use crate::config::Config;
use crate::constants::keys;
use crate::state::SharedState;

pub async fn cmd_login(
    config: &Config,
    username: Option<&str>,
    password: &str,
) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;

    let username = match username {
        Some(name) => name.to_string(),
        None => match state.storage.flag(keys::LAST_USERNAME).await? {
            Some(name) if !name.is_empty() => {
                println!("Using last username: {name}");
                name
            }
            _ => {
                println!("No previous login found. Pass a username.");
                return Ok(());
            }
        },
    };

    match state.services.accounts.login(&username, password).await {
        Ok(user) => {
            state.storage.set_flag(keys::LAST_USERNAME, &user.username).await?;
            println!(
                "✓ Logged in as {} ({}, {})",
                user.username, user.display_name, user.role
            );
        }
        Err(e) => println!("Login failed: {e}"),
    }

    Ok(())
}
