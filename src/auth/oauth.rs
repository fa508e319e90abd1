//! GitHub OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with GitHub and
//! hands out session tokens on success.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;

use super::csrf::{self, STATE_COOKIE};
use crate::AppState;
use crate::api::{ApiResponse, TokenResponse};
use crate::error::AppError;

/// Create authentication router
///
/// Routes:
/// - GET /login - Redirect to GitHub
/// - GET /callback - OAuth callback
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", get(github_redirect).fallback(crate::method_not_allowed))
        .route("/callback", get(github_callback).fallback(crate::method_not_allowed))
}

// =============================================================================
// GitHub OAuth
// =============================================================================

/// GET /login
///
/// Redirects user to GitHub authorization page.
///
/// # Steps
/// 1. Generate CSRF state token
/// 2. Store signed state in cookie
/// 3. Redirect to GitHub with client_id, redirect_uri, scope, state
async fn github_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let oauth_state = csrf::generate_state();
    let cookie_value =
        csrf::sign_state_now(&oauth_state, state.config.session.signing_key.as_bytes())?;
    let location = state.github.authorize_url(&oauth_state)?;

    crate::metrics::LOGIN_REDIRECTS_TOTAL.inc();
    tracing::debug!("Redirecting to GitHub authorization page");

    let cookie = Cookie::build((STATE_COOKIE, cookie_value))
        .path("/")
        .http_only(true)
        .secure(state.config.should_use_secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(csrf::STATE_TTL_MINUTES));

    Ok((jar.add(cookie), Redirect::temporary(location.as_str())))
}

/// Query parameters from GitHub callback
#[derive(Debug, Deserialize)]
struct GitHubCallbackQuery {
    /// Authorization code
    code: Option<String>,
    /// CSRF state token
    state: Option<String>,
    /// Set instead of `code` when the user declines
    error: Option<String>,
    error_description: Option<String>,
}

/// GET /callback
///
/// Handles OAuth callback from GitHub.
///
/// # Steps
/// 1. Verify CSRF state
/// 2. Exchange code for access token
/// 3. Fetch user info from GitHub
/// 4. Issue session token (or return the profile when tokens are disabled)
/// 5. Clear the state cookie
async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<GitHubCallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), AppError> {
    let cookie_value = jar
        .get(STATE_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .ok_or_else(|| {
            tracing::warn!("OAuth callback without state cookie");
            AppError::InvalidState
        })?;
    let returned_state = query.state.as_deref().unwrap_or_default();
    csrf::verify_state(
        &cookie_value,
        returned_state,
        state.config.session.signing_key.as_bytes(),
    )
    .inspect_err(|_| tracing::warn!("OAuth state mismatch"))?;

    if let Some(error) = query.error {
        tracing::warn!(%error, "GitHub authorization was denied");
        return Err(AppError::AuthorizationDenied(
            query.error_description.unwrap_or(error),
        ));
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| {
            tracing::warn!("OAuth callback without code");
            AppError::MissingCode
        })?;

    let access_token = state
        .github
        .exchange_code(&code)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Token exchange failed"))?;

    let profile = state
        .github
        .fetch_user(&access_token)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Fetching GitHub profile failed"))?;

    tracing::info!(user_id = profile.id, login = %profile.login, "GitHub login succeeded");

    let response = if state.config.flow.issue_token {
        let token = state
            .tokens
            .issue(&profile)
            .inspect_err(|e| tracing::error!(error = %e, "Session token signing failed"))?;
        Json(TokenResponse { token }).into_response()
    } else {
        Json(ApiResponse::ok(profile)).into_response()
    };

    let jar = jar.remove(Cookie::build(STATE_COOKIE).path("/"));
    Ok((jar, response))
}
