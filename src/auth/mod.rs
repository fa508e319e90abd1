//! GitHub OAuth authentication
//!
//! Handles:
//! - GitHub OAuth flow
//! - Anti-forgery state cookie
//! - Session tokens
//! - Authentication middleware

pub mod csrf;
pub mod github;
mod middleware;
mod oauth;
pub mod session;

pub use github::GitHubClient;
pub use middleware::{CurrentUser, require_auth};
pub use oauth::auth_router;
pub use session::{SessionClaims, TokenIssuer};
