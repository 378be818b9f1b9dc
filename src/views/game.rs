use serde::Serialize;

use crate::models::{GameStatus, SiteStatus};

/// Build status as testers see it. The link is withheld while unavailable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub available: bool,
    pub link: Option<String>,
    pub site_shutdown: bool,
    pub shutdown_reason: Option<String>,
}

#[must_use]
pub fn game_view(game: &GameStatus, site: &SiteStatus, is_admin: bool) -> GameView {
    let show_link = (game.available || is_admin) && !game.link.is_empty();
    GameView {
        available: game.available,
        link: show_link.then(|| game.link.clone()),
        site_shutdown: site.is_shutdown,
        shutdown_reason: (site.is_shutdown && !site.reason.is_empty()).then(|| site.reason.clone()),
    }
}
