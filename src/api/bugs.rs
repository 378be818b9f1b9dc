use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{AdminUser, CurrentUser};
use super::{ApiError, ApiResponse, AppState};
use crate::models::BugReport;
use crate::services::NewBugReport;

#[derive(Deserialize)]
pub struct SubmitBugRequest {
    pub severity: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub steps: String,
}

/// POST /bugs
pub async fn submit(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    Json(payload): Json<SubmitBugRequest>,
) -> Result<Json<ApiResponse<BugReport>>, ApiError> {
    let bug = state
        .services()
        .bugs
        .submit(
            &ctx,
            NewBugReport {
                severity: payload.severity,
                title: payload.title,
                description: payload.description,
                steps: payload.steps,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(bug)))
}

/// GET /bugs/mine
pub async fn mine(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<Vec<BugReport>>>, ApiError> {
    let bugs = state.services().bugs.mine(&ctx).await?;
    Ok(Json(ApiResponse::success(bugs)))
}

/// GET /bugs
pub async fn list(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
) -> Result<Json<ApiResponse<Vec<BugReport>>>, ApiError> {
    let bugs = state.services().bugs.all(&ctx).await?;
    Ok(Json(ApiResponse::success(bugs)))
}

/// POST /bugs/{id}/fixed
pub async fn mark_fixed(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BugReport>>, ApiError> {
    let bug = state.services().bugs.mark_fixed(&ctx, id).await?;
    Ok(Json(ApiResponse::success(bug)))
}
