//! Tests for the middleware pipeline and built-in middlewares

use super::*;
use crate::auth::{ApiKeyAuth, BearerTokenAuth};
use crate::error::{Error, Result};
use crate::http::{Request, Response};
use crate::types::LogLevel;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// ============================================================================
// Test helpers
// ============================================================================

type Trail = Arc<Mutex<Vec<String>>>;

/// Records the order in which it is visited
struct Recording {
    name: &'static str,
    trail: Trail,
}

impl Recording {
    fn new(name: &'static str, trail: &Trail) -> Self {
        Self {
            name,
            trail: Arc::clone(trail),
        }
    }
}

impl Middleware for Recording {
    fn name(&self) -> &str {
        self.name
    }

    fn process_request(&self, request: Request) -> Result<Request> {
        self.trail.lock().unwrap().push(format!("req:{}", self.name));
        Ok(request.header(format!("X-Seen-{}", self.name), "1"))
    }

    fn process_response(&self, response: Response) -> Result<Response> {
        self.trail.lock().unwrap().push(format!("resp:{}", self.name));
        Ok(response)
    }
}

/// Fails on request, response, or both
struct Failing {
    on_request: bool,
}

impl Middleware for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn process_request(&self, request: Request) -> Result<Request> {
        if self.on_request {
            return Err(Error::middleware("failing", "request rejected"));
        }
        Ok(request)
    }

    fn process_response(&self, _response: Response) -> Result<Response> {
        Err(Error::middleware("failing", "response rejected"))
    }
}

fn trail() -> Trail {
    Arc::new(Mutex::new(Vec::new()))
}

fn recorded(trail: &Trail) -> Vec<String> {
    trail.lock().unwrap().clone()
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_request_order_is_fifo_and_response_order_is_lifo() {
    let trail = trail();
    let mut pipeline = MiddlewarePipeline::new();
    pipeline
        .add(Recording::new("A", &trail))
        .add(Recording::new("B", &trail))
        .add(Recording::new("C", &trail));

    let request = pipeline.execute_request(Request::get("/x")).unwrap();
    pipeline
        .execute_response(Response::new(200, "/x"))
        .unwrap();

    assert_eq!(
        recorded(&trail),
        vec!["req:A", "req:B", "req:C", "resp:C", "resp:B", "resp:A"]
    );
    assert_eq!(request.header_value("x-seen-b"), Some("1"));
    assert_eq!(pipeline.names(), vec!["A", "B", "C"]);
    assert_eq!(pipeline.len(), 3);
}

#[test]
fn test_empty_pipeline_is_identity() {
    let pipeline = MiddlewarePipeline::new();
    assert!(pipeline.is_empty());

    let request = Request::get("/x").param("a", "1").header("H", "v");
    assert_eq!(pipeline.execute_request(request.clone()).unwrap(), request);

    let response = Response::new(201, "/x").with_body("ok");
    assert_eq!(
        pipeline.execute_response(response.clone()).unwrap(),
        response
    );
}

#[test]
fn test_request_error_stops_the_chain() {
    let trail = trail();
    let mut pipeline = MiddlewarePipeline::new();
    pipeline
        .add(Recording::new("A", &trail))
        .add(Failing { on_request: true })
        .add(Recording::new("C", &trail));

    let err = pipeline.execute_request(Request::get("/x")).unwrap_err();
    assert!(matches!(err, Error::Middleware { ref name, .. } if name == "failing"));
    assert_eq!(recorded(&trail), vec!["req:A"]);
}

#[test]
fn test_response_error_stops_the_chain() {
    let trail = trail();
    let mut pipeline = MiddlewarePipeline::new();
    pipeline
        .add(Recording::new("A", &trail))
        .add(Failing { on_request: false })
        .add(Recording::new("C", &trail));

    let err = pipeline
        .execute_response(Response::new(200, "/x"))
        .unwrap_err();
    assert!(err.to_string().contains("response rejected"));
    // C runs first on the way back, A is never reached
    assert_eq!(recorded(&trail), vec!["resp:C"]);
}

#[test]
fn test_shared_middleware() {
    let trail = trail();
    let shared: Arc<dyn Middleware> = Arc::new(Recording::new("S", &trail));

    let mut first = MiddlewarePipeline::new();
    first.add_shared(Arc::clone(&shared));
    let mut second = first.clone();
    second.add_shared(shared);

    first.execute_request(Request::get("/a")).unwrap();
    second.execute_request(Request::get("/b")).unwrap();

    assert_eq!(recorded(&trail), vec!["req:S", "req:S", "req:S"]);
    assert!(format!("{second:?}").contains("\"S\""));
}

// ============================================================================
// Built-in middlewares
// ============================================================================

#[test]
fn test_auth_middleware_applies_bearer_token() {
    let mut pipeline = MiddlewarePipeline::new();
    pipeline.add(AuthMiddleware::new(BearerTokenAuth::new("tok").unwrap()));

    let request = pipeline.execute_request(Request::get("/me")).unwrap();
    assert_eq!(request.headers.get("Authorization").unwrap(), "Bearer tok");
    assert_eq!(request.url, "/me");

    let response = Response::new(200, "/me").with_body("body");
    assert_eq!(
        pipeline.execute_response(response.clone()).unwrap(),
        response
    );
}

#[test]
fn test_auth_middleware_api_key_query() {
    let middleware = AuthMiddleware::new(ApiKeyAuth::query("k-123").unwrap());
    let request = middleware
        .process_request(Request::get("/items").param("page", "2"))
        .unwrap();

    assert_eq!(request.params.get("api_key").unwrap(), "k-123");
    assert_eq!(request.params.get("page").unwrap(), "2");
    assert!(request.headers.is_empty());
}

#[test]
fn test_header_middleware_overwrites() {
    let middleware = HeaderMiddleware::default()
        .header("X-Client", "solidafy")
        .header("Accept", "application/json");

    let request = middleware
        .process_request(Request::get("/").header("Accept", "text/plain").header("X-Other", "1"))
        .unwrap();

    assert_eq!(request.headers.get("Accept").unwrap(), "application/json");
    assert_eq!(request.headers.get("X-Client").unwrap(), "solidafy");
    assert_eq!(request.headers.get("X-Other").unwrap(), "1");

    let request = middleware
        .process_request(Request::get("/").header("accept", "text/plain"))
        .unwrap();
    assert_eq!(request.headers.len(), 2);
    assert_eq!(request.header_value("ACCEPT"), Some("application/json"));
}

#[test]
fn test_logging_middleware_passes_through() {
    let middleware = LoggingMiddleware::with_level(LogLevel::Debug);
    assert_eq!(middleware.level(), LogLevel::Debug);
    assert_eq!(LoggingMiddleware::new().level(), LogLevel::Info);

    let request = Request::post("/x").json(serde_json::json!({"a": 1}));
    assert_eq!(middleware.process_request(request.clone()).unwrap(), request);

    let response = Response::new(500, "/x").with_elapsed(Duration::from_millis(3));
    assert_eq!(
        middleware.process_response(response.clone()).unwrap(),
        response
    );
}

#[test]
fn test_rate_limit_middleware_times_out() {
    let middleware = RateLimitMiddleware::new(1.0, 1)
        .unwrap()
        .timeout(Duration::from_millis(50));

    assert!(middleware.process_request(Request::get("/a")).is_ok());

    let started = Instant::now();
    let err = middleware.process_request(Request::get("/a")).unwrap_err();
    assert!(started.elapsed() >= Duration::from_millis(40));
    assert!(err.is_retryable());
    let retry_after = err.retry_after().unwrap();
    assert!(retry_after > Duration::ZERO && retry_after <= Duration::from_secs(1));
}

#[test]
fn test_rate_limit_middleware_per_endpoint() {
    let middleware = RateLimitMiddleware::new(1.0, 1)
        .unwrap()
        .per_endpoint()
        .timeout(Duration::from_millis(10));
    assert!(middleware.is_per_endpoint());

    assert!(middleware.process_request(Request::get("/a?x=1")).is_ok());
    assert!(middleware.process_request(Request::get("/b")).is_ok());
    // Same endpoint as the first call, query string ignored
    assert!(middleware.process_request(Request::get("/a?x=2")).is_err());

    middleware.reset();
    assert!(middleware.process_request(Request::get("/a")).is_ok());

    // Buckets outlive reset; one per endpoint
    let a = middleware.bucket_for("/a").unwrap();
    assert!(Arc::ptr_eq(&a, &middleware.bucket_for("/a").unwrap()));
    assert!(!Arc::ptr_eq(&a, &middleware.bucket_for("/b").unwrap()));
}

#[test]
fn test_rate_limit_middleware_from_config() {
    let config = crate::rate_limit::RateLimitConfig {
        per_endpoint: true,
        ..crate::rate_limit::RateLimitConfig::new(5.0, 2)
    }
    .acquire_timeout(Duration::from_millis(20));

    let middleware = RateLimitMiddleware::from_config(&config).unwrap();
    assert!(middleware.is_per_endpoint());
    let bucket = middleware.bucket_for("/a").unwrap();
    assert!(Arc::ptr_eq(&bucket, &middleware.bucket_for("/a").unwrap()));
    assert!(!Arc::ptr_eq(&bucket, &middleware.bucket_for("/b").unwrap()));

    let invalid = crate::rate_limit::RateLimitConfig::new(-1.0, 2);
    assert!(RateLimitMiddleware::from_config(&invalid).is_err());
}
