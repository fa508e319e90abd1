//! E2E tests for health check, routing and CORS

mod common;

use common::{FRONTEND_ORIGIN, TestServer};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_root_echoes_path() {
    let server = TestServer::new().await;

    let response = server.client.get(&server.url("/")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "Hello World! /");
}

#[tokio::test]
async fn test_404_for_unknown_routes() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/unknown/route"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_unsupported_method_is_not_found() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(&server.url("/login"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "method_not_allowed");
    assert_eq!(body["message"], "Method is not supported");
}

#[tokio::test]
async fn test_cors_preflight_returns_allow_lists() {
    let server = TestServer::new().await;

    for route in ["/login", "/callback", "/api/user"] {
        let response = server
            .client
            .request(reqwest::Method::OPTIONS, server.url(route))
            .header("Origin", FRONTEND_ORIGIN)
            .header("Access-Control-Request-Method", "GET")
            .header("Access-Control-Request-Headers", "authorization")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "preflight for {route}");
        let headers = response.headers();
        assert_eq!(
            headers["access-control-allow-origin"].to_str().unwrap(),
            FRONTEND_ORIGIN
        );
        let methods = headers["access-control-allow-methods"]
            .to_str()
            .unwrap()
            .to_ascii_uppercase();
        for method in ["GET", "POST", "PUT", "DELETE"] {
            assert!(methods.contains(method), "{method} missing from {methods}");
        }
        let allowed_headers = headers["access-control-allow-headers"]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(allowed_headers.contains("authorization"));
        assert!(allowed_headers.contains("content-type"));
        assert_eq!(
            headers["access-control-allow-credentials"].to_str().unwrap(),
            "true"
        );
    }
}

#[tokio::test]
async fn test_cors_ignores_other_origins() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/health"))
        .header("Origin", "https://evil.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_metrics_requires_authentication() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_metrics_accepts_session_bearer_token() {
    let server = TestServer::new().await;
    let token = server
        .state
        .tokens
        .issue(&squash_auth::api::UserProfile::demo())
        .unwrap();

    let response = server
        .client
        .get(&server.url("/metrics"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}
