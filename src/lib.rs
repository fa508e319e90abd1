//! squash-auth - "Login with GitHub" for the squash app
//!
//! # Flow
//!
//! ```text
//! browser ── GET /login ──▶ 307 to GitHub (state cookie set)
//!    │
//!    ◀── GitHub consent ──▶ GET /callback?code=…&state=…
//!                               │ verify state
//!                               │ exchange code      ──▶ GitHub token endpoint
//!                               │ fetch profile      ──▶ GitHub user API
//!                               │ sign session token
//!                               ▼
//!                          {"token": "<jwt>"}
//! ```
//!
//! # Modules
//!
//! - `api`: Response envelope and profile endpoint
//! - `auth`: GitHub OAuth flow and session tokens
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Read-only after startup; cloned for each request.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// GitHub OAuth client
    pub github: Arc<auth::GitHubClient>,

    /// Session token issuer
    pub tokens: Arc<auth::TokenIssuer>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Errors
    /// Returns error if the outbound HTTP client cannot be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let github = auth::GitHubClient::new(&config.github)?;
        let tokens = auth::TokenIssuer::from_config(&config.session);

        tracing::info!(
            issue_token = config.flow.issue_token,
            profile_source = ?config.flow.profile_source,
            "Application state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            github: Arc::new(github),
            tokens: Arc::new(tokens),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware, routing::get};
    use tower_http::trace::TraceLayer;

    let cors_layer = build_cors_layer(&state.config.cors);

    let metrics_routes = api::metrics_router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_auth,
    ));

    Router::new()
        .route("/", get(echo_path).fallback(method_not_allowed))
        .route("/health", get(health_check).fallback(method_not_allowed))
        .merge(auth::auth_router())
        .merge(api::user_router())
        .merge(metrics_routes)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// CORS policy for the configured frontend origin
///
/// Entries that do not parse are logged and left out of the policy.
pub fn build_cors_layer(cors: &config::CorsConfig) -> tower_http::cors::CorsLayer {
    use axum::http::{HeaderName, HeaderValue};
    use http::Method;
    use tower_http::cors::CorsLayer;

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|method| {
            Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
                .inspect_err(|error| tracing::warn!(%error, %method, "Ignoring invalid CORS method"))
                .ok()
        })
        .collect();

    let headers: Vec<HeaderName> = cors
        .allowed_headers
        .iter()
        .filter_map(|header| {
            HeaderName::from_bytes(header.trim().as_bytes())
                .inspect_err(|error| tracing::warn!(%error, %header, "Ignoring invalid CORS header"))
                .ok()
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(cors.allow_credentials);

    match HeaderValue::from_str(cors.allowed_origin.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %cors.allowed_origin,
                "Failed to parse CORS origin; denying cross-origin requests"
            );
            layer
        }
    }
}

/// GET /
async fn echo_path(uri: axum::http::Uri) -> String {
    format!("Hello World! {}", uri.path())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn not_found() -> error::AppError {
    error::AppError::NotFound
}

pub(crate) async fn method_not_allowed() -> error::AppError {
    error::AppError::MethodNotAllowed
}
