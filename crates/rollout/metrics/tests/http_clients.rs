//! HTTP collaborator clients against a mock server

use rollout_metrics::{
    AuthoritySwitch, HealthChecker, HttpAuthoritySwitch, HttpHealthChecker, HttpMetricsClient,
    MetricsConfig, MetricsError, MetricsSource, RetryPolicy, ServiceEndpoint,
};
use rollout_types::AuthorityLevel;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> MetricsConfig {
    MetricsConfig {
        quality_url: format!("{}/metrics/quality", server.uri()),
        orchestrator_stats_url: format!("{}/api/stats", server.uri()),
        switch_url: format!("{}/authority", server.uri()),
        request_timeout_ms: 2000,
        health_timeout_ms: 2000,
        retry: RetryPolicy {
            max_attempts: 3,
            initial_delay_ms: 5,
            multiplier: 2.0,
            max_delay_ms: 20,
        },
    }
}

#[tokio::test]
async fn fetch_combines_both_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metrics/quality"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quality": 0.8, "coherence": 0.75, "precision": 0.85
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "completed_tasks": 30, "failed_tasks": 1, "failure_rate": 0.02,
            "success_rate": 0.97, "avg_execution_ms": 120.0
        })))
        .mount(&server)
        .await;

    let client = HttpMetricsClient::new(&config_for(&server)).unwrap();
    let snapshot = client.fetch().await.unwrap();

    assert_eq!(snapshot.quality, 0.8);
    assert_eq!(snapshot.coherence, 0.75);
    assert_eq!(snapshot.precision, 0.85);
    assert_eq!(snapshot.completed_tasks, 30);
    assert_eq!(snapshot.failure_rate, 0.02);
    assert_eq!(snapshot.dependent_success_rate, 0.97);
    assert_eq!(snapshot.avg_execution_ms, 120.0);
}

#[tokio::test]
async fn missing_rates_are_derived_from_counts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metrics/quality"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "quality": 0.6 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "completed_tasks": 90, "failed_tasks": 10
        })))
        .mount(&server)
        .await;

    let client = HttpMetricsClient::new(&config_for(&server)).unwrap();
    let snapshot = client.fetch().await.unwrap();

    assert!((snapshot.failure_rate - 0.1).abs() < 1e-12);
    assert!((snapshot.dependent_success_rate - 0.9).abs() < 1e-12);
    assert_eq!(snapshot.coherence, 0.0);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metrics/quality"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metrics/quality"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "quality": 0.7 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "completed_tasks": 5 })))
        .mount(&server)
        .await;

    let client = HttpMetricsClient::new(&config_for(&server)).unwrap();
    let snapshot = client.fetch().await.unwrap();
    assert_eq!(snapshot.quality, 0.7);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metrics/quality"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = HttpMetricsClient::new(&config_for(&server)).unwrap();
    let err = client.fetch().await.unwrap_err();
    assert!(matches!(err, MetricsError::Status { status: 404, .. }));
}

#[tokio::test]
async fn health_checks_classify_services() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orchestrator/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/audit/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let checker = HttpHealthChecker::new(&config_for(&server)).unwrap();
    let services = vec![
        ServiceEndpoint::new("orchestrator", format!("{}/orchestrator/health", server.uri())),
        ServiceEndpoint::new("audit", format!("{}/audit/health", server.uri())),
    ];

    let results = checker.check_all(&services).await;
    assert_eq!(results.len(), 2);
    assert!(results[0].healthy);
    assert_eq!(results[0].name, "orchestrator");
    assert!(!results[1].healthy);
    assert!(results[1].error.as_deref().unwrap_or_default().contains("503"));
}

#[tokio::test]
async fn switch_posts_level() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authority"))
        .and(body_json(json!({ "level": "partial" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let switch = HttpAuthoritySwitch::new(&config_for(&server)).unwrap();
    switch.apply(AuthorityLevel::Partial).await.unwrap();
}

#[tokio::test]
async fn switch_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authority"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let switch = HttpAuthoritySwitch::new(&config_for(&server)).unwrap();
    let err = switch.apply(AuthorityLevel::Full).await.unwrap_err();
    assert!(matches!(err, MetricsError::Switch(_)));
    assert!(err.to_string().contains("boom"));
}
