use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{AdminUser, CurrentUser};
use super::{ApiError, ApiResponse, AppState};
use crate::views::game::{GameView, game_view};

#[derive(Deserialize)]
pub struct UpdateGameRequest {
    pub available: bool,
    #[serde(default)]
    pub link: String,
}

/// GET /game
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<GameView>>, ApiError> {
    let status = &state.services().status;
    let game = status.game_status().await?;
    let site = status.site_status().await?;
    Ok(Json(ApiResponse::success(game_view(
        &game,
        &site,
        ctx.is_admin(),
    ))))
}

/// PUT /game
pub async fn update_game(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Json(payload): Json<UpdateGameRequest>,
) -> Result<Json<ApiResponse<GameView>>, ApiError> {
    let status = &state.services().status;
    let game = status
        .update_game_status(&ctx, payload.available, &payload.link)
        .await?;
    let site = status.site_status().await?;
    Ok(Json(ApiResponse::success(game_view(&game, &site, true))))
}
