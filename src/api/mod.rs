use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use time;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::state::SharedState;

pub mod articles;
pub mod auth;
mod error;
pub mod news;
pub mod reviews;
mod system;
mod types;
pub mod users;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn news(&self) -> &Arc<crate::clients::newsapi::NewsApiClient> {
        &self.shared.news
    }

    #[must_use]
    pub fn mail(&self) -> &Arc<crate::clients::mail::MailClient> {
        &self.shared.mail
    }

    #[must_use]
    pub fn cascades(&self) -> &crate::services::CascadeService {
        &self.shared.cascades
    }

    #[must_use]
    pub fn password_resets(&self) -> &crate::services::PasswordResetService {
        &self.shared.password_resets
    }
}

pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
    })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, session_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_minutes,
        )
    };

    let protected_routes = create_protected_router();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_minutes,
        )));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/verify-reset", post(auth::verify_reset))
        // The create handler resolves the session user itself, so it can
        // share the path with the public listing.
        .route(
            "/articles",
            get(articles::list_articles).post(articles::post_article),
        )
        .route("/articles/search", get(articles::search_articles))
        .route("/users/{username}", get(users::get_profile))
        .route("/system/status", get(system::get_status))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
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
}

fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/articles/favourites", get(articles::list_favourites))
        .route("/articles/{id}", get(articles::get_article))
        .route("/articles/{id}", put(articles::update_article))
        .route("/articles/{id}", delete(articles::delete_article))
        .route("/articles/{id}/like", post(articles::toggle_like))
        .route("/articles/{id}/reviews", post(reviews::add_review))
        .route(
            "/articles/{id}/reviews/{review_id}",
            delete(reviews::delete_review),
        )
        .route("/users/me", put(users::update_profile))
        .route("/users/me", delete(users::delete_account))
        .route("/news", get(news::search_news))
        .route("/news/headlines", get(news::headlines))
        .route("/news/inspiration", get(news::inspiration))
        .route_layer(middleware::from_fn(auth::auth_middleware))
}
