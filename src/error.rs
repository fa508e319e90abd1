//! Error types for squash-auth
//!
//! All errors in the service are converted to `AppError`,
//! which implements `IntoResponse` and renders the failure envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ApiResponse;

/// Application-wide error type
///
/// Every failure a request can hit maps to exactly one variant, and
/// every variant maps to exactly one [`ErrorKind`] and status code.
#[derive(Debug, Error)]
pub enum AppError {
    /// Route does not exist (404)
    #[error("Resource not found")]
    NotFound,

    /// Route exists but not for this method (404)
    #[error("Method is not supported")]
    MethodNotAllowed,

    /// Missing or invalid session token (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Anti-forgery state missing, expired or mismatched (400)
    #[error("Invalid OAuth state")]
    InvalidState,

    /// Callback reached without an authorization code (400)
    #[error("Missing authorization code")]
    MissingCode,

    /// User or provider refused the authorization request (400)
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// Code exchange with the provider failed (500)
    #[error("Failed to exchange token: {0}")]
    TokenExchange(String),

    /// Profile request to the provider failed (500)
    #[error("Failed to get user info: {0}")]
    ProfileFetch(String),

    /// Provider returned a profile we could not decode (500)
    #[error("Failed to decode user info: {0}")]
    ProfileDecode(String),

    /// Session token could not be signed (500)
    #[error("Failed to sign session token: {0}")]
    TokenSigning(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Closed set of error kinds exposed in failure envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    MethodNotAllowed,
    Unauthorized,
    InvalidState,
    MissingCode,
    AuthorizationDenied,
    TokenExchange,
    ProfileFetch,
    ProfileDecode,
    TokenSigning,
    Config,
    Internal,
}

impl ErrorKind {
    /// Stable label used in metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::MethodNotAllowed => "method_not_allowed",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::MissingCode => "missing_code",
            ErrorKind::AuthorizationDenied => "authorization_denied",
            ErrorKind::TokenExchange => "token_exchange",
            ErrorKind::ProfileFetch => "profile_fetch",
            ErrorKind::ProfileDecode => "profile_decode",
            ErrorKind::TokenSigning => "token_signing",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound => ErrorKind::NotFound,
            AppError::MethodNotAllowed => ErrorKind::MethodNotAllowed,
            AppError::Unauthorized => ErrorKind::Unauthorized,
            AppError::InvalidState => ErrorKind::InvalidState,
            AppError::MissingCode => ErrorKind::MissingCode,
            AppError::AuthorizationDenied(_) => ErrorKind::AuthorizationDenied,
            AppError::TokenExchange(_) => ErrorKind::TokenExchange,
            AppError::ProfileFetch(_) => ErrorKind::ProfileFetch,
            AppError::ProfileDecode(_) => ErrorKind::ProfileDecode,
            AppError::TokenSigning(_) => ErrorKind::TokenSigning,
            AppError::Config(_) => ErrorKind::Config,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound | AppError::MethodNotAllowed => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidState | AppError::MissingCode | AppError::AuthorizationDenied(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::TokenExchange(_)
            | AppError::ProfileFetch(_)
            | AppError::ProfileDecode(_)
            | AppError::TokenSigning(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Renders the failure envelope with the error kind and a
    /// human-readable message. Internal details are not leaked.
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = self.status();
        let message = match &self {
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            other => other.to_string(),
        };

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[kind.as_str()]).inc();

        crate::api::respond(status, ApiResponse::<()>::failure(kind, message))
    }
}
