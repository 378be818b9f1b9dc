use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::domain::DeskEvent;
use crate::services::Services;
use crate::state::SharedState;
use crate::storage::Storage;

mod accounts;
pub mod auth;
mod bugs;
mod error;
mod events;
mod game;
mod logs;
mod notifications;
mod observability;
mod profile;
mod requests;
mod suggestions;
mod system;
mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn services(&self) -> &Services {
        &self.shared.services
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<Storage> {
        &self.shared.storage
    }

    #[must_use]
    pub fn event_bus(&self) -> &broadcast::Sender<DeskEvent> {
        &self.shared.event_bus
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, inactivity_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_inactivity_minutes,
        )
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            inactivity_minutes,
        )));

    let api_router = api_routes()
        .layer(session_layer)
        .layer(middleware::from_fn(observability::logging_middleware))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

/// Every route. Access is enforced per handler by the `CurrentUser` and
/// `AdminUser` extractors.
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(system::health))
        .route(
            "/auth/setup",
            get(auth::setup_status).post(auth::setup),
        )
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/last-username", get(auth::last_username))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_password))
        .route("/profile", get(profile::get_profile))
        .route("/profile/handle", put(profile::link_handle))
        .route(
            "/accounts",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route(
            "/accounts/{username}",
            put(accounts::update_account).delete(accounts::delete_account),
        )
        .route(
            "/accounts/{username}/password",
            get(accounts::reveal_password),
        )
        .route("/requests", get(requests::board).post(requests::submit))
        .route(
            "/requests/enabled",
            get(requests::get_enabled).put(requests::set_enabled),
        )
        .route("/requests/{id}/approve", post(requests::approve))
        .route("/requests/{id}/reject", post(requests::reject))
        .route("/bugs", get(bugs::list).post(bugs::submit))
        .route("/bugs/mine", get(bugs::mine))
        .route("/bugs/{id}/fixed", post(bugs::mark_fixed))
        .route(
            "/suggestions",
            get(suggestions::list).post(suggestions::submit),
        )
        .route("/suggestions/mine", get(suggestions::mine))
        .route("/suggestions/{id}/accept", post(suggestions::accept))
        .route("/suggestions/{id}/reject", post(suggestions::reject))
        .route(
            "/notifications",
            get(notifications::get_inbox)
                .post(notifications::send)
                .delete(notifications::clear),
        )
        .route("/notifications/read", post(notifications::mark_all_read))
        .route("/logs", get(logs::list).delete(logs::clear))
        .route("/logs/public", get(logs::public_account_log))
        .route("/game", get(game::get_game).put(game::update_game))
        .route(
            "/system/site",
            get(system::get_site).put(system::update_site),
        )
        .route("/system/sync", get(system::get_sync))
        .route("/dashboard", get(system::dashboard))
        .route("/metrics", get(observability::get_metrics))
        .route("/events", get(events::sse_handler))
}
