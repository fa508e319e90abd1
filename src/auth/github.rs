//! GitHub OAuth client
//!
//! Thin wrapper over `reqwest` for the three provider interactions:
//! building the authorization URL, exchanging the code, and fetching
//! the user's profile. Every outbound call is bounded by the configured
//! timeout.

use std::time::Instant;

use serde::Deserialize;
use url::Url;

use crate::api::UserProfile;
use crate::config::GitHubConfig;
use crate::error::AppError;
use crate::metrics::observe_provider_request;

/// GitHub token response
///
/// GitHub answers a bad code with `200 OK` and an `error` body, so both
/// shapes are accepted here and told apart afterwards.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GitHubTokenResponse {
    Token { access_token: String },
    Error {
        error: String,
        #[serde(default)]
        error_description: Option<String>,
    },
}

/// Access token obtained from the code exchange
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub secret: String,
}

/// Client for GitHub's OAuth and user endpoints
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubClient {
    /// Build a client whose requests time out after `github.timeout_seconds`
    pub fn new(config: &GitHubConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("squash-auth/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.timeout())
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// Authorization URL the browser is redirected to
    pub fn authorize_url(&self, state: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.config.authorize_url)
            .map_err(|e| AppError::Config(format!("github.authorize_url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);
        Ok(url)
    }

    /// Exchange an authorization code for an access token
    ///
    /// # Errors
    /// `TokenExchange` on transport errors, timeouts, non-2xx answers,
    /// or an OAuth error body
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, AppError> {
        let started = Instant::now();
        let result = self.request_token(code).await;
        observe_provider_request(
            "token_exchange",
            if result.is_ok() { "ok" } else { "error" },
            started.elapsed(),
        );
        result
    }

    async fn request_token(&self, code: &str) -> Result<AccessToken, AppError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::TokenExchange(describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::TokenExchange(format!(
                "provider returned {}",
                status
            )));
        }

        let body: GitHubTokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::TokenExchange(describe(&e)))?;

        match body {
            GitHubTokenResponse::Token { access_token } => Ok(AccessToken {
                secret: access_token,
            }),
            GitHubTokenResponse::Error {
                error,
                error_description,
            } => Err(AppError::TokenExchange(match error_description {
                Some(description) => format!("{error}: {description}"),
                None => error,
            })),
        }
    }

    /// Fetch the authenticated user's profile
    ///
    /// # Errors
    /// `ProfileFetch` on transport errors, timeouts or non-2xx answers;
    /// `ProfileDecode` if the body is not a profile document
    pub async fn fetch_user(&self, token: &AccessToken) -> Result<UserProfile, AppError> {
        let started = Instant::now();
        let result = self.request_user(token).await;
        let status = match &result {
            Ok(_) => "ok",
            Err(AppError::ProfileDecode(_)) => "decode_error",
            Err(_) => "error",
        };
        observe_provider_request("user_profile", status, started.elapsed());
        result
    }

    async fn request_user(&self, token: &AccessToken) -> Result<UserProfile, AppError> {
        let response = self
            .http
            .get(&self.config.user_api_url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .bearer_auth(&token.secret)
            .send()
            .await
            .map_err(|e| AppError::ProfileFetch(describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ProfileFetch(format!(
                "provider returned {}",
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::ProfileFetch(describe(&e)))?;

        serde_json::from_slice(&body).map_err(|e| AppError::ProfileDecode(e.to_string()))
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request to provider timed out".to_string()
    } else {
        error.to_string()
    }
}
