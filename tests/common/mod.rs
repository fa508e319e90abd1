//! Common test utilities for E2E tests

#![allow(dead_code)]

use squash_auth::{AppState, config};
use tokio::net::TcpListener;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const FRONTEND_ORIGIN: &str = "http://localhost:4200";
pub const SIGNING_KEY: &str = "test-signing-key-32-bytes-long!!";

/// Test server instance backed by a mocked GitHub
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub github: MockServer,
    pub client: reqwest::Client,
}

/// Configuration pointing every GitHub endpoint at `provider_uri`
pub fn test_config(provider_uri: &str) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
        },
        github: config::GitHubConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_url: "http://localhost:8080/callback".to_string(),
            scopes: vec!["read:user".to_string()],
            authorize_url: format!("{provider_uri}/login/oauth/authorize"),
            token_url: format!("{provider_uri}/login/oauth/access_token"),
            user_api_url: format!("{provider_uri}/user"),
            timeout_seconds: 2,
        },
        session: config::SessionConfig {
            signing_key: SIGNING_KEY.to_string(),
            ttl_seconds: 86_400,
        },
        flow: config::FlowConfig {
            issue_token: true,
            profile_source: config::ProfileSource::Live,
        },
        cors: config::CorsConfig {
            allowed_origin: FRONTEND_ORIGIN.to_string(),
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
            ],
            allowed_headers: vec!["Authorization".to_string(), "Content-Type".to_string()],
            allow_credentials: true,
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance with the default test configuration
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after letting the caller adjust the configuration
    pub async fn with_config(adjust: impl FnOnce(&mut config::AppConfig)) -> Self {
        let github = MockServer::start().await;

        let mut config = test_config(&github.uri());
        adjust(&mut config);

        let state = AppState::new(config).unwrap();

        // Redirects are asserted on, never followed
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = squash_auth::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            github,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Start a login and return the `state` sent to GitHub together with
    /// the `Cookie` header value that carries it back
    pub async fn begin_login(&self) -> (String, String) {
        let response = self
            .client
            .get(self.url("/login"))
            .send()
            .await
            .expect("login request succeeds");
        assert!(response.status().is_redirection());

        let location = response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .expect("location header");
        let state = url::Url::parse(location)
            .expect("absolute redirect")
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .expect("state parameter");

        let cookie = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|raw| {
                let pair = raw.split(';').next()?;
                pair.starts_with("oauth_state=").then(|| pair.to_string())
            })
            .expect("oauth_state cookie");

        (state, cookie)
    }

    /// Run the whole login round trip and call `/callback` with `code`
    pub async fn complete_login(&self, code: &str) -> reqwest::Response {
        let (state, cookie) = self.begin_login().await;
        self.client
            .get(self.url("/callback"))
            .query(&[("code", code), ("state", state.as_str())])
            .header("Cookie", cookie)
            .send()
            .await
            .expect("callback request succeeds")
    }

    /// GitHub accepts `code` and hands out `access_token`
    pub async fn mock_token_exchange(&self, code: &str, access_token: &str) {
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .and(body_string_contains(format!("code={code}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": access_token,
                "token_type": "bearer",
                "scope": "read:user",
            })))
            .mount(&self.github)
            .await;
    }

    /// GitHub answers the token endpoint with `status` for every code
    pub async fn mock_token_exchange_status(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
                "message": "Bad credentials",
            })))
            .mount(&self.github)
            .await;
    }

    /// GitHub returns `response` from the user endpoint for `access_token`
    pub async fn mock_user(&self, access_token: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("authorization", format!("Bearer {access_token}").as_str()))
            .respond_with(response)
            .mount(&self.github)
            .await;
    }
}
