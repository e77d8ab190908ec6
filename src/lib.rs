//! Quillpost - backend for a single-author poetry blog
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Public blog, comment and site endpoints                  │
//! │  - Admin back-office endpoints                              │
//! │  - Moderator login                                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Comment threads and moderation                           │
//! │  - Bot verification (reCAPTCHA)                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `verification`: External bot verification
//! - `data`: Database layer
//! - `auth`: Moderator sessions
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;
pub mod verification;

use std::sync::Arc;

use data::CommentStore;
use verification::BotVerifier;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// the database pool and the services built on it.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Comment threads and moderation
    pub comments: Arc<service::CommentService>,

    /// Blog posts
    pub blog: Arc<service::BlogService>,

    /// Contact messages and newsletter subscribers
    pub outreach: Arc<service::OutreachService>,

    /// Gallery images and social links
    pub showcase: Arc<service::ShowcaseService>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database and run migrations
    /// 2. Build the HTTP client for external verification
    /// 3. Select the bot verifier
    /// 4. Wire services
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!(path = %config.database.path.display(), "Database connected");

        // 2. Initialize HTTP client; verification deadlines are enforced by the service
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("Quillpost/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        // 3. Bot verifier
        let verifier = verification::build_verifier(&config.captcha, http_client)?;
        tracing::info!(provider = ?config.captcha.provider, "Bot verifier ready");

        let state = Self::from_parts(config, Arc::new(db), verifier);
        tracing::info!("Application state initialized successfully");
        Ok(state)
    }

    /// Wire services around an open database and a chosen verifier
    pub fn from_parts(
        config: config::AppConfig,
        db: Arc<data::Database>,
        verifier: Arc<dyn BotVerifier>,
    ) -> Self {
        let store_timeout = config.comments.store_timeout();
        let read_retry = service::RetryPolicy::from(&config.comments.read_retry);

        let store: Arc<dyn CommentStore> = db.clone();
        let comments = service::CommentService::new(
            store,
            verifier.clone(),
            service::CommentSettings::from_config(&config),
        );
        let blog = service::BlogService::new(db.clone(), store_timeout, read_retry);
        let outreach = service::OutreachService::new(
            db.clone(),
            verifier,
            store_timeout,
            config.captcha.timeout(),
        );
        let showcase = service::ShowcaseService::new(db.clone(), store_timeout);

        Self {
            config: Arc::new(config),
            db,
            comments: Arc::new(comments),
            blog: Arc::new(blog),
            outreach: Arc::new(outreach),
            showcase: Arc::new(showcase),
        }
    }
}

/// Largest accepted JSON body; post bodies are the biggest payloads
const MAX_REQUEST_BODY_BYTES: usize = 256 * 1024;

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, extract::DefaultBodyLimit, middleware};
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let cors_layer = build_cors_layer(&state.config.server);

    let protected = Router::new()
        .nest("/api/admin", api::admin_router())
        .merge(api::metrics_router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router())
        .merge(api::blog_router())
        .merge(api::site_router())
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::{HeaderValue, Method, header};
    use tower_http::cors::CorsLayer;

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = std::iter::once(server.base_url())
        .chain(server.cors_origins.iter().cloned())
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::error!(%error, %origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    // Credentialed requests carry the session cookie, which rules out wildcards
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

async fn health_check() -> &'static str {
    "OK"
}
