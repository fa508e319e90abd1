//! Authentication middleware
//!
//! Protects routes that require a session token.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::Response,
};

use super::session::SessionClaims;
use crate::AppState;
use crate::error::AppError;

fn extract_token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<SessionClaims, AppError> {
    let token = extract_token_from_headers(headers).ok_or(AppError::Unauthorized)?;
    state.tokens.verify(token)
}

/// Middleware to require authentication
///
/// Verifies the bearer session token and adds its claims to the
/// request extensions.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/metrics", ...)
///     .layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(request.headers(), &state)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Current user extractor
///
/// Reuses claims already verified by [`require_auth`], otherwise reads
/// the bearer token itself. Rejects with `Unauthorized`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionClaims);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<SessionClaims>().cloned() {
            return Ok(CurrentUser(claims));
        }

        let app_state = AppState::from_ref(state);
        let claims = authenticate(&parts.headers, &app_state)?;
        parts.extensions.insert(claims.clone());
        Ok(CurrentUser(claims))
    }
}
