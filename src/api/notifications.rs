use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{AdminUser, CurrentUser};
use super::{ApiError, ApiResponse, AppState, CountResponse};
use crate::models::NotificationKind;
use crate::services::Recipient;
use crate::views::inbox::{InboxView, inbox};

#[derive(Deserialize)]
pub struct SendNotificationRequest {
    /// `all` for every tester, otherwise a username.
    pub recipient: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// GET /notifications
pub async fn get_inbox(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<InboxView>>, ApiError> {
    let notifications = state.services().notifications.inbox(&ctx).await?;
    Ok(Json(ApiResponse::success(inbox(notifications))))
}

/// POST /notifications/read
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.services().notifications.mark_all_read(&ctx).await?;
    Ok(Json(ApiResponse::success(CountResponse { count })))
}

/// DELETE /notifications
pub async fn clear(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.services().notifications.clear(&ctx).await?;
    Ok(Json(ApiResponse::success(CountResponse { count })))
}

/// POST /notifications
pub async fn send(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Json(payload): Json<SendNotificationRequest>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state
        .services()
        .notifications
        .send(
            &ctx,
            Recipient::parse(&payload.recipient),
            payload.kind,
            &payload.title,
            &payload.message,
        )
        .await?;
    Ok(Json(ApiResponse::success(CountResponse { count })))
}
