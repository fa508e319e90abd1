//! API layer
//!
//! HTTP handlers for:
//! - User profile
//! - Metrics (Prometheus)
//!
//! and the response envelope shared by every endpoint.

mod dto;
pub mod metrics;
mod user;

pub use dto::*;

pub use metrics::metrics_router;
pub use user::user_router;
