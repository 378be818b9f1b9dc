use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::AdminUser;
use super::{ApiError, ApiResponse, AppState, EnabledResponse, MessageResponse};
use crate::services::NewAccountRequest;
use crate::views::requests::{RequestBoard, RequestCard};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub reason: String,
}

#[derive(Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedResponse {
    pub username: String,
    pub display_name: String,
}

/// POST /requests
/// Public: anyone can ask for a tester account.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<ApiResponse<RequestCard>>, ApiError> {
    let created = state
        .services()
        .requests
        .submit(NewAccountRequest {
            username: payload.username,
            password: payload.password,
            display_name: payload.display_name,
            reason: payload.reason,
        })
        .await?;
    Ok(Json(ApiResponse::success(RequestCard::from(&created))))
}

/// GET /requests/enabled
pub async fn get_enabled(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<EnabledResponse>>, ApiError> {
    let enabled = state.services().requests.enabled().await?;
    Ok(Json(ApiResponse::success(EnabledResponse { enabled })))
}

/// PUT /requests/enabled
pub async fn set_enabled(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Json(payload): Json<SetEnabledRequest>,
) -> Result<Json<ApiResponse<EnabledResponse>>, ApiError> {
    state
        .services()
        .requests
        .set_enabled(&ctx, payload.enabled)
        .await?;
    Ok(Json(ApiResponse::success(EnabledResponse {
        enabled: payload.enabled,
    })))
}

/// GET /requests
pub async fn board(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
) -> Result<Json<ApiResponse<RequestBoard>>, ApiError> {
    let board = state.services().requests.board(&ctx).await?;
    Ok(Json(ApiResponse::success(board)))
}

/// POST /requests/{id}/approve
pub async fn approve(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ApprovedResponse>>, ApiError> {
    let user = state.services().requests.approve(&ctx, id).await?;
    Ok(Json(ApiResponse::success(ApprovedResponse {
        username: user.username,
        display_name: user.display_name,
    })))
}

/// POST /requests/{id}/reject
pub async fn reject(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.services().requests.reject(&ctx, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Request rejected",
    ))))
}
