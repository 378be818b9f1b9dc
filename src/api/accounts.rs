use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::AdminUser;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::models::Role;
use crate::services::{AccountUpdate, CreatedAccount};
use crate::views::accounts::AccountCard;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub username: String,
    pub display_name: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

const fn default_role() -> Role {
    Role::User
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub new_password: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Serialize)]
pub struct RevealedPassword {
    pub password: Option<String>,
}

/// GET /accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
) -> Result<Json<ApiResponse<Vec<AccountCard>>>, ApiError> {
    let cards = state.services().accounts.list_accounts(&ctx).await?;
    Ok(Json(ApiResponse::success(cards)))
}

/// POST /accounts
/// The generated password is only ever returned here.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<Json<ApiResponse<CreatedAccount>>, ApiError> {
    let created = state
        .services()
        .accounts
        .create_account(&ctx, &payload.username, &payload.display_name, payload.role)
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

/// PUT /accounts/{username}
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Path(username): Path<String>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .services()
        .accounts
        .update_account(
            &ctx,
            &username,
            AccountUpdate {
                new_password: payload.new_password,
                display_name: payload.display_name,
                role: payload.role,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Account {username} updated"
    )))))
}

/// DELETE /accounts/{username}
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .services()
        .accounts
        .delete_account(&ctx, &username)
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Account {username} deleted"
    )))))
}

/// GET /accounts/{username}/password
pub async fn reveal_password(
    State(state): State<Arc<AppState>>,
    AdminUser(ctx): AdminUser,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<RevealedPassword>>, ApiError> {
    let password = state
        .services()
        .accounts
        .reveal_password(&ctx, &username)
        .await?;
    Ok(Json(ApiResponse::success(RevealedPassword { password })))
}
