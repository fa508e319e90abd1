//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Once;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Login flow
    pub static ref LOGIN_REDIRECTS_TOTAL: IntCounter = IntCounter::new(
        "squash_auth_login_redirects_total",
        "Total number of redirects to the identity provider"
    ).expect("metric can be created");
    pub static ref SESSION_TOKENS_ISSUED_TOTAL: IntCounter = IntCounter::new(
        "squash_auth_session_tokens_issued_total",
        "Total number of session tokens issued"
    ).expect("metric can be created");

    // Identity provider calls
    pub static ref PROVIDER_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("squash_auth_provider_requests_total", "Total number of requests to the identity provider"),
        &["operation", "status"]
    ).expect("metric can be created");
    pub static ref PROVIDER_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "squash_auth_provider_request_duration_seconds",
            "Identity provider request duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("squash_auth_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(LOGIN_REDIRECTS_TOTAL.clone()))
            .expect("LOGIN_REDIRECTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(SESSION_TOKENS_ISSUED_TOTAL.clone()))
            .expect("SESSION_TOKENS_ISSUED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(PROVIDER_REQUESTS_TOTAL.clone()))
            .expect("PROVIDER_REQUESTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(PROVIDER_REQUEST_DURATION_SECONDS.clone()))
            .expect("PROVIDER_REQUEST_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}

/// Record the outcome and latency of one identity provider call
pub fn observe_provider_request(operation: &str, status: &str, elapsed: std::time::Duration) {
    PROVIDER_REQUESTS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
    PROVIDER_REQUEST_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(elapsed.as_secs_f64());
}
