//! Reset-local command handler

use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_reset_local(config: &Config) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    state.storage.reset_local().await?;
    println!("✓ Local store wiped and reseeded. Remote data was not touched.");
    Ok(())
}
