use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AdminUser;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::models::{LogCategory, LogEntry};

#[derive(Deserialize)]
pub struct LogQuery {
    /// A category name, or `all`.
    pub category: Option<String>,
}

impl LogQuery {
    fn category(&self) -> Result<Option<LogCategory>, ApiError> {
        match self.category.as_deref().map(str::trim) {
            None | Some("" | "all") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(ApiError::validation),
        }
    }
}

/// GET /logs
pub async fn list(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Query(query): Query<LogQuery>,
) -> Result<Json<ApiResponse<Vec<LogEntry>>>, ApiError> {
    let logs = state
        .services()
        .activity
        .list(&ctx, query.category()?)
        .await?;
    Ok(Json(ApiResponse::success(logs)))
}

/// GET /logs/public
/// Account activity, readable without logging in.
pub async fn public_account_log(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<LogEntry>>>, ApiError> {
    let logs = state.services().activity.public_account_log().await?;
    Ok(Json(ApiResponse::success(logs)))
}

/// DELETE /logs
pub async fn clear(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.services().activity.clear(&ctx).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new("Logs cleared"))))
}
