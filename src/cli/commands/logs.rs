//! Logs command handler

use super::operator;
use crate::config::Config;
use crate::models::LogCategory;
use crate::state::SharedState;

pub async fn cmd_logs(config: &Config, category: Option<&str>) -> anyhow::Result<()> {
    let filter = match category {
        None | Some("all") => None,
        Some(raw) => match raw.parse::<LogCategory>() {
            Ok(category) => Some(category),
            Err(e) => {
                println!("{e}");
                return Ok(());
            }
        },
    };

    let state = SharedState::new(config.clone()).await?;
    let logs = state.services.activity.list(&operator(), filter).await?;

    if logs.is_empty() {
        println!("No logs available");
        return Ok(());
    }

    for entry in logs {
        println!(
            "{} [{}] {} - {}",
            entry.timestamp, entry.category, entry.user, entry.message
        );
    }

    Ok(())
}
