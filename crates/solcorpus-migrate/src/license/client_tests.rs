//! Tests for the throttled API client.

use super::*;
use std::time::{Duration, Instant, UNIX_EPOCH};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> ApiClient {
    ApiClient::new(Some("ghp_test".to_string()), RateLimitPolicy::immediate())
}

#[tokio::test]
async fn test_fetch_success_sends_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/coin"))
        .and(header("Authorization", "Bearer ghp_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client();
    let response = client
        .fetch(&format!("{}/repos/acme/coin", server.uri()))
        .await
        .unwrap();

    assert_eq!(response, ApiResponse::Success(serde_json::json!({"id": 1})));
    assert_eq!(client.requests_issued(), 1);
}

#[tokio::test]
async fn test_fetch_not_found_is_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client();
    let response = client
        .fetch(&format!("{}/repos/acme/gone", server.uri()))
        .await
        .unwrap();

    assert_eq!(response, ApiResponse::Failed(Some(404)));
    assert_eq!(client.requests_issued(), 1);
}

#[tokio::test]
async fn test_fetch_retries_every_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/coin"))
        .respond_with(ResponseTemplate::new(403).insert_header("retry-after", "0"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/coin"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"license": null})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client();
    let response = client
        .fetch(&format!("{}/repos/acme/coin", server.uri()))
        .await
        .unwrap();

    assert!(matches!(response, ApiResponse::Success(_)));
    assert_eq!(client.requests_issued(), 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_fetch_waits_until_reset() {
    let server = MockServer::start().await;
    let reset = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 2;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(403).insert_header("x-ratelimit-reset", reset.to_string()),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let client = client();
    let started = Instant::now();
    let response = client
        .fetch(&format!("{}/repos/acme/coin", server.uri()))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert!(matches!(response, ApiResponse::Success(_)));
    assert!(elapsed >= Duration::from_secs(1), "waited only {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(10), "waited {:?}", elapsed);
    assert_eq!(client.requests_issued(), 2);
}

#[tokio::test]
async fn test_fetch_applies_throttle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let policy = RateLimitPolicy {
        throttle: Duration::from_millis(50),
        default_retry_after: Duration::ZERO,
    };
    let client = ApiClient::new(None, policy);
    let url = format!("{}/repos/acme/coin", server.uri());

    let started = Instant::now();
    client.fetch(&url).await.unwrap();
    client.fetch(&url).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_fetch_unreachable_host_is_network_error() {
    let client = client();
    let result = client.fetch("http://127.0.0.1:1/repos/acme/coin").await;

    assert!(matches!(result, Err(Error::Network(_))));
    assert_eq!(client.requests_issued(), 1);
}

#[test]
fn test_user_agent() {
    assert!(USER_AGENT.starts_with("solcorpus-migrate/"));
}
