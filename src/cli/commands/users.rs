//! Users command handler

use super::operator;
use crate::config::Config;
use crate::state::SharedState;
use crate::views::PasswordDisplay;

pub async fn cmd_users(config: &Config) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let cards = state.services.accounts.list_accounts(&operator()).await?;

    if cards.is_empty() {
        println!("No accounts yet.");
        println!();
        println!("Create the primary admin with: betadesk setup <username> <display-name> --password <pin>");
        return Ok(());
    }

    println!("Accounts ({} total)", cards.len());
    println!("{:-<70}", "");

    for card in cards {
        let marker = if card.is_main_admin { "★" } else { "•" };
        let password = match card.password {
            PasswordDisplay::Revealable => "revealable",
            PasswordDisplay::Protected => "protected",
            PasswordDisplay::Unavailable => "hidden",
        };
        println!("{} {} [{}]", marker, card.username, card.role);
        println!(
            "  Display name: {} | Handle: {} | Password: {}",
            card.display_name,
            card.linked_handle.as_deref().unwrap_or("-"),
            password
        );
    }

    Ok(())
}
