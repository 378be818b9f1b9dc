//! Requests command handler

use super::operator;
use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_requests(config: &Config) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let enabled = state.services.requests.enabled().await?;
    let board = state.services.requests.board(&operator()).await?;

    println!(
        "Account requests are {}",
        if enabled { "open" } else { "closed" }
    );
    println!();

    println!("Pending ({})", board.pending.len());
    println!("{:-<70}", "");
    if board.pending.is_empty() {
        println!("No pending requests");
    }
    for request in &board.pending {
        println!("[{}] {} ({})", request.id, request.username, request.display_name);
        println!("  Reason: {}", request.reason);
        println!("  Sent: {}", request.timestamp);
    }

    println!();
    println!("Recently accepted");
    println!("{:-<70}", "");
    if board.recently_accepted.is_empty() {
        println!("No recently accepted accounts");
    }
    for request in &board.recently_accepted {
        println!(
            "✓ {} ({}) accepted {}",
            request.username,
            request.display_name,
            request.accepted_at.as_deref().unwrap_or("?")
        );
    }

    Ok(())
}
