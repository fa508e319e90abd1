//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values (including the legacy `GITHUB_*` / `JWT_SECRET` variables)
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (SQUASH__*, override)

use serde::Deserialize;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub github: GitHubConfig,
    pub session: SessionConfig,
    pub flow: FlowConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// GitHub OAuth configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Where GitHub sends the browser back to (our `/callback`)
    pub redirect_url: String,
    pub scopes: Vec<String>,
    pub authorize_url: String,
    pub token_url: String,
    /// Profile endpoint called with the access token
    pub user_api_url: String,
    /// Upper bound for each call to GitHub, connect included
    pub timeout_seconds: u64,
}

impl GitHubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Session token configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Symmetric key for session tokens and the OAuth state cookie
    pub signing_key: String,
    /// Session token lifetime in seconds (default: 86400 = 24h)
    pub ttl_seconds: i64,
}

/// Where `/api/user` gets its profile from
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSource {
    /// Profile embedded in the caller's session token
    #[default]
    Live,
    /// Fixed demo profile
    Static,
}

/// Behaviour switches for the login flow
#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    /// Answer the callback with a signed session token instead of the raw profile
    pub issue_token: bool,
    #[serde(default)]
    pub profile_source: ProfileSource,
}

/// CORS policy for the single frontend origin
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origin: String,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    #[serde(default)]
    pub allow_credentials: bool,
}

/// Logging configuration
///
/// `RUST_LOG`, when set, takes precedence over `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

const LIST_KEYS: [&str; 3] = [
    "github.scopes",
    "cors.allowed_methods",
    "cors.allowed_headers",
];

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (SQUASH__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let mut environment = Environment::with_prefix("SQUASH")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",");
        for key in LIST_KEYS {
            environment = environment.with_list_parse_key(key);
        }

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("github.client_id", legacy_env("GITHUB_CLIENT_ID"))?
            .set_default("github.client_secret", legacy_env("GITHUB_CLIENT_SECRET"))?
            .set_default(
                "github.redirect_url",
                std::env::var("GITHUB_REDIRECT_URL")
                    .unwrap_or_else(|_| "http://localhost:8080/callback".to_string()),
            )?
            .set_default("github.scopes", vec!["read:user"])?
            .set_default(
                "github.authorize_url",
                "https://github.com/login/oauth/authorize",
            )?
            .set_default(
                "github.token_url",
                "https://github.com/login/oauth/access_token",
            )?
            .set_default("github.user_api_url", "https://api.github.com/user")?
            .set_default("github.timeout_seconds", 10)?
            .set_default("session.signing_key", legacy_env("JWT_SECRET"))?
            .set_default("session.ttl_seconds", 86400)?
            .set_default("flow.issue_token", true)?
            .set_default("flow.profile_source", "live")?
            .set_default("cors.allowed_origin", "http://localhost:4200")?
            .set_default("cors.allowed_methods", vec!["GET", "POST", "PUT", "DELETE"])?
            .set_default("cors.allowed_headers", vec!["Authorization", "Content-Type"])?
            .set_default("cors.allow_credentials", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment)
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        if self.github.timeout_seconds == 0 {
            return Err(AppError::Config(
                "github.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.session.ttl_seconds <= 0 {
            return Err(AppError::Config(
                "session.ttl_seconds must be greater than 0".to_string(),
            ));
        }

        for (key, value) in [
            ("github.redirect_url", &self.github.redirect_url),
            ("github.authorize_url", &self.github.authorize_url),
            ("github.token_url", &self.github.token_url),
            ("github.user_api_url", &self.github.user_api_url),
            ("cors.allowed_origin", &self.cors.allowed_origin),
        ] {
            url::Url::parse(value)
                .map_err(|e| AppError::Config(format!("{key} is not a valid URL: {e}")))?;
        }

        Ok(())
    }

    /// Log settings that load fine but will fail at first use
    pub fn warn_incomplete(&self) {
        if self.github.client_id.is_empty() || self.github.client_secret.is_empty() {
            tracing::warn!("GitHub client credentials are not set; logins will fail");
        }

        if self.session.signing_key.is_empty() {
            tracing::warn!("session.signing_key is empty; session tokens cannot be issued");
        } else if self.session.signing_key.len() < 32 {
            tracing::warn!(
                length = self.session.signing_key.len(),
                "session.signing_key is shorter than 32 bytes"
            );
        }
    }

    /// Whether cookies we set should carry the `Secure` attribute
    pub fn should_use_secure_cookies(&self) -> bool {
        self.github.redirect_url.starts_with("https://")
    }
}

fn legacy_env(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}
