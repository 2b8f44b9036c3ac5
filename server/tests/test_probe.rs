//! Probe adapter tests against a local mock server

use std::time::{Duration, Instant};

use portald::models::HealthStatus;
use portald::monitor::probe::check_custom_endpoint;
use portald::monitor::railway::{check_railway, RailwayConfig};
use portald::monitor::vercel::{check_vercel, VercelConfig};

use secrecy::SecretString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn test_custom_endpoint_2xx_is_healthy() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body("ok")
        .create_async()
        .await;

    let result = check_custom_endpoint(&client(), &format!("{}/health", server.url())).await;

    mock.assert_async().await;
    assert_eq!(result.status, HealthStatus::Healthy);
    assert!(result.response_time.is_some());
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_custom_endpoint_non_2xx_is_down_with_http_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/health")
        .with_status(503)
        .create_async()
        .await;

    let result = check_custom_endpoint(&client(), &format!("{}/health", server.url())).await;

    assert_eq!(result.status, HealthStatus::Down);
    assert_eq!(result.error.as_deref(), Some("HTTP 503"));
}

/// Serves one connection: reads the request, waits, then optionally
/// answers with a 200.
async fn delayed_listener(delay: Duration, respond: bool) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        tokio::time::sleep(delay).await;
        if respond {
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
                .await;
        }
    });

    addr
}

#[tokio::test]
async fn test_custom_endpoint_slow_2xx_is_degraded_not_healthy() {
    let addr = delayed_listener(Duration::from_millis(3300), true).await;

    let result = check_custom_endpoint(&client(), &format!("http://{}/health", addr)).await;

    assert_eq!(result.status, HealthStatus::Degraded);
    assert_eq!(result.error.as_deref(), Some("Slow response time"));
    assert!(result.response_time.unwrap() > 3000);
}

#[tokio::test]
async fn test_custom_endpoint_unresponsive_target_times_out_to_down() {
    // Holds the connection open far past the probe timeout
    let addr = delayed_listener(Duration::from_secs(60), false).await;

    let start = Instant::now();
    let result = check_custom_endpoint(&client(), &format!("http://{}/health", addr)).await;

    assert_eq!(result.status, HealthStatus::Down);
    assert!(result.error.is_some());
    // The 10 s request timeout aborts the call rather than hanging
    assert!(start.elapsed() < Duration::from_secs(12));
}

#[tokio::test]
async fn test_custom_endpoint_invalid_url_is_down_without_io() {
    let result = check_custom_endpoint(&client(), "not a url").await;

    assert_eq!(result.status, HealthStatus::Down);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .starts_with("Invalid health endpoint URL"));
    assert!(result.response_time.is_none());
}

#[tokio::test]
async fn test_custom_endpoint_connection_failure_is_down() {
    // Nothing listens on this port
    let result = check_custom_endpoint(&client(), "http://127.0.0.1:9/health").await;

    assert_eq!(result.status, HealthStatus::Down);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_custom_endpoint_failure_classification_is_idempotent() {
    let url = "http://127.0.0.1:9/health";

    let first = check_custom_endpoint(&client(), url).await;
    let second = check_custom_endpoint(&client(), url).await;

    // Timing-derived fields may differ; the classification must not
    assert_eq!(first.status, second.status);
    assert_eq!(first.status, HealthStatus::Down);
}

fn railway_config(server: &mockito::Server) -> RailwayConfig {
    RailwayConfig {
        api_token: Some(SecretString::from("test-token")),
        api_url: format!("{}/graphql/v2", server.url()),
    }
}

#[tokio::test]
async fn test_railway_success_deployment_is_healthy() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/graphql/v2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"data":{"service":{"id":"svc-1","name":"api","deployments":{"edges":[{"node":{"id":"dep-1","status":"SUCCESS","createdAt":"2025-01-01T00:00:00Z"}}]}}}}"#,
        )
        .create_async()
        .await;

    let result = check_railway(&client(), &railway_config(&server), "svc-1").await;

    assert_eq!(result.status, HealthStatus::Healthy);
    assert!(result.response_time.is_some());
}

#[tokio::test]
async fn test_railway_query_error_is_down() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/graphql/v2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"errors":[{"message":"Service not found"}]}"#)
        .create_async()
        .await;

    let result = check_railway(&client(), &railway_config(&server), "svc-1").await;

    assert_eq!(result.status, HealthStatus::Down);
    assert_eq!(result.error.as_deref(), Some("Service not found"));
}

#[tokio::test]
async fn test_railway_without_deployments_is_unknown() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/graphql/v2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":{"service":{"id":"svc-1","name":"api","deployments":{"edges":[]}}}}"#)
        .create_async()
        .await;

    let result = check_railway(&client(), &railway_config(&server), "svc-1").await;

    assert_eq!(result.status, HealthStatus::Unknown);
    assert_eq!(result.error.as_deref(), Some("No deployments found"));
}

#[tokio::test]
async fn test_railway_crashed_deployment_is_down() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/graphql/v2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"data":{"service":{"id":"svc-1","name":"api","deployments":{"edges":[{"node":{"id":"dep-1","status":"CRASHED","createdAt":"2025-01-01T00:00:00Z"}}]}}}}"#,
        )
        .create_async()
        .await;

    let result = check_railway(&client(), &railway_config(&server), "svc-1").await;

    assert_eq!(result.status, HealthStatus::Down);
}

fn vercel_config(server: &mockito::Server) -> VercelConfig {
    VercelConfig {
        api_token: Some(SecretString::from("test-token")),
        api_url: server.url(),
    }
}

#[tokio::test]
async fn test_vercel_ready_deployment_is_healthy() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v6/deployments")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"deployments":[{"uid":"dep-1","state":"READY"}]}"#)
        .create_async()
        .await;

    let result = check_vercel(&client(), &vercel_config(&server), "prj_1").await;

    assert_eq!(result.status, HealthStatus::Healthy);
}

#[tokio::test]
async fn test_vercel_api_failure_is_down_with_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v6/deployments")
        .match_query(mockito::Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let result = check_vercel(&client(), &vercel_config(&server), "prj_1").await;

    assert_eq!(result.status, HealthStatus::Down);
    assert_eq!(result.error.as_deref(), Some("Vercel API returned 500"));
}

#[tokio::test]
async fn test_vercel_without_deployments_is_unknown() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v6/deployments")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"deployments":[]}"#)
        .create_async()
        .await;

    let result = check_vercel(&client(), &vercel_config(&server), "prj_1").await;

    assert_eq!(result.status, HealthStatus::Unknown);
    assert_eq!(result.error.as_deref(), Some("No deployments found"));
}
