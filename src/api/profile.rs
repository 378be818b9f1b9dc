use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState};
use crate::views::accounts::{ProfileView, profile_view};

#[derive(Deserialize)]
pub struct LinkHandleRequest {
    pub handle: String,
}

/// GET /profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<ProfileView>>, ApiError> {
    let profile = state.services().accounts.profile(&ctx).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /profile/handle
pub async fn link_handle(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    Json(payload): Json<LinkHandleRequest>,
) -> Result<Json<ApiResponse<ProfileView>>, ApiError> {
    let user = state
        .services()
        .accounts
        .link_handle(&ctx, &payload.handle)
        .await?;
    Ok(Json(ApiResponse::success(profile_view(&user))))
}
