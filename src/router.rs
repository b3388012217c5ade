use std::time::Duration;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::config::Config;
use crate::db::Storage;
use crate::error::BookswapError;
use crate::handlers::{auth, books, exchanges, families, health, users};
use crate::security::{PasswordHasher, TokenService};

/// Process-wide dependencies, built once at startup and shared by every handler.
#[derive(Clone)]
pub struct BookswapState {
    pub storage: Storage,
    pub tokens: TokenService,
    pub passwords: PasswordHasher,
}

impl BookswapState {
    pub fn new(storage: Storage, tokens: TokenService, passwords: PasswordHasher) -> Self {
        Self {
            storage,
            tokens,
            passwords,
        }
    }

    /// Connect storage (creating the schema) and build the auth services from `cfg`.
    pub async fn from_config(cfg: &Config) -> Result<Self, BookswapError> {
        if cfg.uses_dev_secret() {
            warn!("secret_key is the development default; set SECRET_KEY in production");
        }
        let tokens = TokenService::new(
            cfg.secret_key.as_bytes().to_vec(),
            Duration::from_secs(cfg.access_token_ttl_minutes.saturating_mul(60)),
        )
        .map_err(|e| BookswapError::Config(e.to_string()))?;
        let storage = Storage::connect(&cfg.database_url).await?;
        Ok(Self::new(
            storage,
            tokens,
            PasswordHasher::new(cfg.bcrypt_cost),
        ))
    }
}

pub fn bookswap_router(state: BookswapState, cors_allow_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/token", post(auth::login_for_access_token))
        .route("/auth/register", post(auth::register))
        .route("/auth/me", get(auth::me))
        .route(
            "/families",
            get(families::list_families).post(families::create_family),
        )
        .route(
            "/families/{id}",
            get(families::read_family)
                .put(families::update_family)
                .delete(families::delete_family),
        )
        .route("/families/{id}/books", get(families::list_family_books))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::read_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/{id}",
            get(books::read_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route(
            "/exchanges",
            get(exchanges::list_exchanges).post(exchanges::create_exchange),
        )
        .route(
            "/exchanges/{id}",
            get(exchanges::read_exchange)
                .put(exchanges::update_exchange)
                .delete(exchanges::delete_exchange),
        )
        .layer(cors_layer(cors_allow_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| {
            o.parse::<HeaderValue>()
                .inspect_err(|_| warn!(origin = %o, "ignoring invalid CORS origin"))
                .ok()
        })
        .collect();
    layer.allow_origin(parsed)
}
