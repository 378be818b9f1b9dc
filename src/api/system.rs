//! Health, site switch, sync status and the admin dashboard.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::AdminUser;
use super::{ApiError, ApiResponse, AppState};
use crate::models::SiteStatus;
use crate::storage::SyncReport;
use crate::views::dashboard::DashboardView;

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: bool,
    pub remote: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ready: bool,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

#[derive(Deserialize)]
pub struct UpdateSiteRequest {
    pub shutdown: bool,
    #[serde(default)]
    pub reason: String,
}

/// GET /health
/// 503 when the local store cannot be reached. A degraded remote is
/// reported but does not fail the check.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = state.shared.store.ping().await.is_ok();
    let report = state.storage().sync_report().await;
    let remote = report
        .remote_enabled
        .then(|| report.collections.iter().all(|c| !c.degraded));

    let body = HealthResponse {
        ready: database,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        checks: HealthChecks { database, remote },
    };
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ApiResponse::success(body)))
}

/// GET /system/site
pub async fn get_site(
    State(state): State<Arc<AppState>>,
    AdminUser(_ctx): AdminUser,
) -> Result<Json<ApiResponse<SiteStatus>>, ApiError> {
    let site = state.services().status.site_status().await?;
    Ok(Json(ApiResponse::success(site)))
}

/// PUT /system/site
pub async fn update_site(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Json(payload): Json<UpdateSiteRequest>,
) -> Result<Json<ApiResponse<SiteStatus>>, ApiError> {
    let site = state
        .services()
        .status
        .set_site_status(&ctx, payload.shutdown, &payload.reason)
        .await?;
    Ok(Json(ApiResponse::success(site)))
}

/// GET /system/sync
pub async fn get_sync(
    State(state): State<Arc<AppState>>,
    AdminUser(_ctx): AdminUser,
) -> Json<ApiResponse<SyncReport>> {
    Json(ApiResponse::success(state.storage().sync_report().await))
}

/// GET /dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
) -> Result<Json<ApiResponse<DashboardView>>, ApiError> {
    let view = state.services().dashboard.overview(&ctx).await?;
    Ok(Json(ApiResponse::success(view)))
}
