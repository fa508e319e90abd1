//! Profile endpoint

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use super::dto::{ApiResponse, UserProfile};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::config::ProfileSource;
use crate::error::AppError;

/// Create user router
///
/// Routes:
/// - GET /api/user - Current user's profile
pub fn user_router() -> Router<AppState> {
    Router::new().route(
        "/api/user",
        get(get_user).fallback(crate::method_not_allowed),
    )
}

/// GET /api/user
///
/// With a static profile source this always answers with the demo
/// profile. Otherwise the caller must present a session token and the
/// profile embedded in it is echoed back.
async fn get_user(
    State(state): State<AppState>,
    user: Result<CurrentUser, AppError>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    match state.config.flow.profile_source {
        ProfileSource::Static => Ok(Json(ApiResponse::ok(UserProfile::demo()))),
        ProfileSource::Live => {
            let CurrentUser(claims) = user?;
            Ok(Json(ApiResponse::ok(claims.profile()?)))
        }
    }
}
