use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{AdminUser, CurrentUser};
use super::{ApiError, ApiResponse, AppState};
use crate::models::Suggestion;
use crate::services::NewSuggestion;

#[derive(Deserialize)]
pub struct SubmitSuggestionRequest {
    #[serde(default)]
    pub category: String,
    pub title: String,
    pub description: String,
}

/// POST /suggestions
pub async fn submit(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    Json(payload): Json<SubmitSuggestionRequest>,
) -> Result<Json<ApiResponse<Suggestion>>, ApiError> {
    let suggestion = state
        .services()
        .suggestions
        .submit(
            &ctx,
            NewSuggestion {
                category: payload.category,
                title: payload.title,
                description: payload.description,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(suggestion)))
}

/// GET /suggestions/mine
pub async fn mine(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<Vec<Suggestion>>>, ApiError> {
    let suggestions = state.services().suggestions.mine(&ctx).await?;
    Ok(Json(ApiResponse::success(suggestions)))
}

/// GET /suggestions
pub async fn list(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
) -> Result<Json<ApiResponse<Vec<Suggestion>>>, ApiError> {
    let suggestions = state.services().suggestions.all(&ctx).await?;
    Ok(Json(ApiResponse::success(suggestions)))
}

/// POST /suggestions/{id}/accept
pub async fn accept(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Suggestion>>, ApiError> {
    let suggestion = state.services().suggestions.accept(&ctx, id).await?;
    Ok(Json(ApiResponse::success(suggestion)))
}

/// POST /suggestions/{id}/reject
pub async fn reject(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Suggestion>>, ApiError> {
    let suggestion = state.services().suggestions.reject(&ctx, id).await?;
    Ok(Json(ApiResponse::success(suggestion)))
}
