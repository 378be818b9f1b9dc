use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{HeaderMap, header, request::Parts},
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;
use tower_sessions::cookie::{Cookie, SameSite};

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::constants::session as session_keys;
use crate::services::SessionContext;
use crate::views::accounts::{ProfileView, profile_view};

// ============================================================================
// Extractors
// ============================================================================

/// The logged-in caller, re-read from storage on every request so role
/// changes and deletions apply immediately.
pub struct CurrentUser(pub SessionContext);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(ApiError::unauthorized)?;

        let username = session_username(&session).await?;

        let Some(user) = state.services().accounts.current(&username).await? else {
            let _ = session.flush().await;
            return Err(ApiError::unauthorized());
        };

        tracing::Span::current().record("user_id", tracing::field::display(&user.username));
        Ok(Self(SessionContext::from(&user)))
    }
}

/// A logged-in admin. Testers get 403.
pub struct AdminUser(pub SessionContext);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(ctx) = CurrentUser::from_request_parts(parts, state).await?;
        ctx.require_admin()?;
        Ok(Self(ctx))
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub display_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupStatusResponse {
    pub needs_setup: bool,
}

#[derive(Serialize)]
pub struct LastUsernameResponse {
    pub username: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /auth/setup
pub async fn setup_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SetupStatusResponse>>, ApiError> {
    let needs_setup = state.services().accounts.needs_setup().await?;
    Ok(Json(ApiResponse::success(SetupStatusResponse { needs_setup })))
}

/// POST /auth/setup
/// Creates the primary admin and logs it in.
pub async fn setup(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SetupRequest>,
) -> Result<Json<ApiResponse<ProfileView>>, ApiError> {
    let user = state
        .services()
        .accounts
        .setup_primary_admin(
            &payload.username,
            &payload.password,
            &payload.confirm_password,
            &payload.display_name,
        )
        .await?;

    start_session(&session, &user.username).await?;
    Ok(Json(ApiResponse::success(profile_view(&user))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .services()
        .accounts
        .login(&payload.username, &payload.password)
        .await?;

    start_session(&session, &user.username).await?;

    let secure = state.config().read().await.server.secure_cookies;
    let cookie = Cookie::build((session_keys::LAST_USERNAME_COOKIE, user.username.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(session_keys::LAST_USERNAME_COOKIE_DAYS))
        .build();

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
        Json(ApiResponse::success(profile_view(&user))),
    ))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// GET /auth/last-username
/// The username of the last successful login from this client.
pub async fn last_username(headers: HeaderMap) -> Json<ApiResponse<LastUsernameResponse>> {
    let username = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == session_keys::LAST_USERNAME_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|name| !name.is_empty());

    Json(ApiResponse::success(LastUsernameResponse { username }))
}

/// GET /auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<ProfileView>>, ApiError> {
    let profile = state.services().accounts.profile(&ctx).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /auth/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .services()
        .accounts
        .change_password(
            &ctx,
            &payload.current_password,
            &payload.new_password,
            &payload.confirm_password,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

// ============================================================================
// Helpers
// ============================================================================

async fn start_session(session: &Session, username: &str) -> Result<(), ApiError> {
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(session_keys::USER_KEY, username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

async fn session_username(session: &Session) -> Result<String, ApiError> {
    session
        .get::<String>(session_keys::USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(ApiError::unauthorized)
}
