//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: client → middleware → rate limiter →
//! retry → reqwest → mock server, and back through the cache and pipeline.
//!
//! The client is blocking, so each test drives it from `spawn_blocking` on a
//! multi-threaded runtime while wiremock serves from the async side.

use serde_json::json;
use solidafy_http::auth::{ApiKeyAuth, BasicAuth, BearerTokenAuth};
use solidafy_http::cache::MemoryCache;
use solidafy_http::middleware::LoggingMiddleware;
use solidafy_http::rate_limit::TokenBucket;
use solidafy_http::retry::{ExponentialBackoff, FullJitterBackoff};
use solidafy_http::{ClientConfig, Error, HttpClient, LogLevel, Request};
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Route client logs to the test output; `RUST_LOG` overrides the level
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::DEBUG.into()),
        )
        .with_test_writer()
        .try_init();
}

fn fast_retry(max_retries: u32) -> ExponentialBackoff {
    ExponentialBackoff::new(max_retries, Duration::from_millis(5), Duration::from_millis(50))
        .unwrap()
}

// ============================================================================
// Basic requests
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_get_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                {"id": 1, "name": "Alice"},
                {"id": 2, "name": "Bob"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let base_url = mock_server.uri();
    let body: serde_json::Value = tokio::task::spawn_blocking(move || {
        let client = HttpClient::builder().base_url(base_url).build().unwrap();
        client
            .get_with_params("/api/users", [("limit", "2")])
            .unwrap()
            .json::<serde_json::Value>()
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(body["users"].as_array().unwrap().len(), 2);
    assert_eq!(body["users"][0]["name"], "Alice");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_json_and_default_headers() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/items"))
        .and(header("X-Client", "integration"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base_url = mock_server.uri();
    let response = tokio::task::spawn_blocking(move || {
        let client = HttpClient::builder()
            .base_url(base_url)
            .header("X-Client", "integration")
            .middleware(LoggingMiddleware::with_level(LogLevel::Debug))
            .build()
            .unwrap();
        client.post("/api/items", json!({"name": "widget"})).unwrap()
    })
    .await
    .unwrap();

    assert_eq!(response.status(), 201);
    assert!(response.elapsed() > Duration::ZERO);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_status_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&mock_server)
        .await;

    let base_url = mock_server.uri();
    let result = tokio::task::spawn_blocking(move || {
        let client = HttpClient::builder().base_url(base_url).build().unwrap();
        let response = client.get("/api/missing").unwrap();
        assert_eq!(response.status(), 404);
        response.error_for_status()
    })
    .await
    .unwrap();

    match result {
        Err(Error::HttpStatus { status, body }) => {
            assert_eq!(status, 404);
            assert_eq!(body, "not here");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_bearer_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/protected"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base_url = mock_server.uri();
    let status = tokio::task::spawn_blocking(move || {
        let client = HttpClient::builder()
            .base_url(base_url)
            .with_auth(BearerTokenAuth::new("test-token").unwrap())
            .build()
            .unwrap();
        client.get("/api/protected").unwrap().status()
    })
    .await
    .unwrap();

    assert_eq!(status, 200);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_basic_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base_url = mock_server.uri();
    let status = tokio::task::spawn_blocking(move || {
        let client = HttpClient::builder()
            .base_url(base_url)
            .with_auth(BasicAuth::new("user", "pass").unwrap())
            .build()
            .unwrap();
        client.get("/").unwrap().status()
    })
    .await
    .unwrap();

    assert_eq!(status, 200);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_key_in_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data"))
        .and(query_param("api_key", "k-123"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base_url = mock_server.uri();
    let status = tokio::task::spawn_blocking(move || {
        let client = HttpClient::builder()
            .base_url(base_url)
            .with_auth(ApiKeyAuth::query("k-123").unwrap())
            .build()
            .unwrap();
        client
            .execute(Request::get("/api/data").param("page", "1"))
            .unwrap()
            .status()
    })
    .await
    .unwrap();

    assert_eq!(status, 200);
}

// ============================================================================
// Retry
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_retry_on_503() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let base_url = mock_server.uri();
    let response = tokio::task::spawn_blocking(move || {
        let client = HttpClient::builder()
            .base_url(base_url)
            .with_retry(fast_retry(3))
            .build()
            .unwrap();
        client.get("/api/flaky").unwrap()
    })
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_retry_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let base_url = mock_server.uri();
    let err = tokio::task::spawn_blocking(move || {
        let client = HttpClient::builder()
            .base_url(base_url)
            .with_retry(fast_retry(2))
            .build()
            .unwrap();
        client.get("/api/broken").unwrap_err()
    })
    .await
    .unwrap();

    assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(err.status(), Some(500));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rate_limited_response_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let base_url = mock_server.uri();
    let status = tokio::task::spawn_blocking(move || {
        let client = HttpClient::builder()
            .base_url(base_url)
            .with_retry(
                FullJitterBackoff::new(2, Duration::from_millis(1), Duration::from_millis(100))
                    .unwrap(),
            )
            .build()
            .unwrap();
        client.get("/api/limited").unwrap().status()
    })
    .await
    .unwrap();

    assert_eq!(status, 200);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_client_error_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base_url = mock_server.uri();
    let status = tokio::task::spawn_blocking(move || {
        let client = HttpClient::builder()
            .base_url(base_url)
            .with_retry(fast_retry(3))
            .build()
            .unwrap();
        client.get("/api/bad").unwrap().status()
    })
    .await
    .unwrap();

    assert_eq!(status, 400);
}

// ============================================================================
// Cache and rate limiting
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_cache_avoids_second_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"v": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base_url = mock_server.uri();
    let (first, second) = tokio::task::spawn_blocking(move || {
        let client = HttpClient::builder()
            .base_url(base_url)
            .cache(MemoryCache::new(Some(Duration::from_secs(60)), 10).unwrap())
            .build()
            .unwrap();
        let first = client.get("/api/config").unwrap();
        let second = client.get("/api/config").unwrap();
        (first, second)
    })
    .await
    .unwrap();

    assert_eq!(first.text(), second.text());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rate_limiter_spaces_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(4)
        .mount(&mock_server)
        .await;

    let base_url = mock_server.uri();
    let elapsed = tokio::task::spawn_blocking(move || {
        let client = HttpClient::builder()
            .base_url(base_url)
            .rate_limit(TokenBucket::new(20.0, 2).unwrap())
            .build()
            .unwrap();
        let started = Instant::now();
        for _ in 0..4 {
            client.get("/api/ping").unwrap();
        }
        started.elapsed()
    })
    .await
    .unwrap();

    // Two tokens up front, then one every 50ms
    assert!(elapsed >= Duration::from_millis(80), "took {elapsed:?}");
}

// ============================================================================
// Config-driven client
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_client_from_yaml_config() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/orders"))
        .and(header("X-API-Key", "secret"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orders": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let yaml = format!(
        r"
base_url: {}/v1
timeout_seconds: 5
headers:
  Accept: application/json
auth:
  type: api_key
  value: secret
retry:
  type: exponential
  max_retries: 2
  base_delay_ms: 5
  max_delay_ms: 20
rate_limit:
  rate: 50
  capacity: 5
cache:
  default_ttl_seconds: 60
logging:
  enabled: true
  level: debug
",
        mock_server.uri()
    );

    let body: serde_json::Value = tokio::task::spawn_blocking(move || {
        let config = ClientConfig::from_yaml_str(&yaml).unwrap();
        let client = HttpClient::from_config(&config).unwrap();
        assert!(client.has_retry());
        assert!(client.has_rate_limiter());
        assert!(client.has_cache());
        assert_eq!(client.pipeline().names(), vec!["auth", "logging"]);

        let body = client
            .get("/orders")
            .unwrap()
            .json::<serde_json::Value>()
            .unwrap();
        // Served from cache
        client.get("/orders").unwrap();
        body
    })
    .await
    .unwrap();

    assert_eq!(body["orders"], json!([]));
}
