//! Data Transfer Objects for the HTTP API

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Uniform response envelope
///
/// Absent fields are omitted from the JSON document rather than
/// rendered as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            error: None,
            data: Some(data),
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            error: Some(kind),
            data: None,
        }
    }
}

/// Write an envelope with the given status code
pub fn respond<T: Serialize>(status: StatusCode, envelope: ApiResponse<T>) -> Response {
    (status, Json(envelope)).into_response()
}

/// Callback response when session tokens are enabled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Authenticated user's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Provider user ID
    pub id: u64,
    /// Provider username
    pub login: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Equipment shown on the demo profile only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub racket: Option<Racket>,
}

/// Squash racket metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Racket {
    pub name: String,
    pub image: String,
    pub purchase_date: String,
    pub usage_count: u32,
    pub grip: String,
    pub string_type: String,
}

impl UserProfile {
    /// Fixed profile served when `flow.profile_source = "static"`
    pub fn demo() -> Self {
        Self {
            id: 1,
            login: "squash-player".to_string(),
            name: Some("Demo Player".to_string()),
            avatar_url: Some("https://avatars.githubusercontent.com/u/583231".to_string()),
            racket: Some(Racket {
                name: "Tecnifibre Carboflex 125".to_string(),
                image: "https://images.example.com/rackets/carboflex-125.png".to_string(),
                purchase_date: "2023-09-01".to_string(),
                usage_count: 42,
                grip: "Tecnifibre Dry Feel".to_string(),
                string_type: "X-One Biphase 1.18".to_string(),
            }),
        }
    }
}
