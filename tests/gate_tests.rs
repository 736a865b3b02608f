//! End-to-end tests for the maintenance layer.
//!
//! Each test drives a router through `tower::ServiceExt::oneshot`. Trigger
//! endpoints and remote maintenance pages are served by a small axum app bound
//! to an ephemeral loopback port, so no external services are needed.
//!
//! Run with: `cargo test --test gate_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, Response, StatusCode};
use axum::routing::get;
use tempfile::NamedTempFile;
use tokio::net::TcpListener;
use tower::ServiceExt;

use maintenance_gate::{
    AppError, AppState, Config, MaintenanceConfig, MaintenanceLayer, build_router,
};

const NEXT_BODY: &str = "next handler";

// ============================================================================
// Fixtures
// ============================================================================

/// In-process upstream serving trigger and maintenance page endpoints.
struct Upstream {
    base_url: String,
    trigger_status: Arc<AtomicU16>,
}

impl Upstream {
    async fn start() -> Self {
        let trigger_status = Arc::new(AtomicU16::new(200));
        let status = trigger_status.clone();

        let app = Router::new()
            .route("/page", get(|| async { "maintenance" }))
            .route(
                "/unavailable",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "not the page") }),
            )
            .route(
                "/trigger",
                get(move || {
                    let status = status.clone();
                    async move { StatusCode::from_u16(status.load(Ordering::SeqCst)).unwrap() }
                }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    "too late"
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            trigger_status,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn set_trigger(&self, status: u16) {
        self.trigger_status.store(status, Ordering::SeqCst);
    }
}

/// Router whose fallback counts how often the gate forwarded.
fn gated_app(config: &MaintenanceConfig) -> (Router, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let app = Router::new()
        .fallback(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                NEXT_BODY
            }
        })
        .layer(MaintenanceLayer::new(config, "test").unwrap());

    (app, calls)
}

fn maintenance_file(contents: &str) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), contents).unwrap();
    file
}

fn file_config(file: &NamedTempFile) -> MaintenanceConfig {
    MaintenanceConfig {
        enabled: true,
        source: file.path().to_str().unwrap().to_string(),
        response_status_code: 503,
        response_content_type: "text/html; charset=utf-8".to_string(),
        ..MaintenanceConfig::default()
    }
}

fn request_from(peer: &str) -> Request<Body> {
    let mut req = Request::builder().uri("/orders").body(Body::empty()).unwrap();
    req.extensions_mut()
        .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
    req
}

async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ============================================================================
// Mode Evaluation
// ============================================================================

#[tokio::test]
async fn test_disabled_always_forwards() {
    let file = maintenance_file("<h1>down</h1>");
    let config = MaintenanceConfig {
        enabled: false,
        ..file_config(&file)
    };
    let (app, calls) = gated_app(&config);

    let response = send(&app, request_from("203.0.113.7:54321")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, NEXT_BODY);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_source_file_forwards() {
    let config = MaintenanceConfig {
        enabled: true,
        source: "/definitely/not/here/maintenance.html".to_string(),
        ..MaintenanceConfig::default()
    };
    let (app, calls) = gated_app(&config);

    let response = send(&app, request_from("203.0.113.7:54321")).await;

    assert_eq!(body_string(response).await, NEXT_BODY);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_file_source_served() {
    let file = maintenance_file("<h1>down</h1>");
    let (app, calls) = gated_app(&file_config(&file));

    let response = send(&app, request_from("203.0.113.7:54321")).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "text/html; charset=utf-8"
    );
    assert_eq!(body_string(response).await, "<h1>down</h1>");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_removing_file_ends_maintenance() {
    let file = maintenance_file("<h1>down</h1>");
    let (app, calls) = gated_app(&file_config(&file));

    let response = send(&app, request_from("203.0.113.7:54321")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    file.close().unwrap();

    let response = send(&app, request_from("203.0.113.7:54321")).await;
    assert_eq!(body_string(response).await, NEXT_BODY);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_repeated_requests_are_idempotent() {
    let file = maintenance_file("<h1>down</h1>");
    let (app, calls) = gated_app(&file_config(&file));

    let first = send(&app, request_from("203.0.113.7:54321")).await;
    let second = send(&app, request_from("203.0.113.7:54321")).await;

    assert_eq!(first.status(), second.status());
    assert_eq!(body_string(first).await, body_string(second).await);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Trigger Endpoint
// ============================================================================

#[tokio::test]
async fn test_trigger_live_serves_page() {
    let upstream = Upstream::start().await;
    let file = maintenance_file("<h1>down</h1>");
    let config = MaintenanceConfig {
        trigger_url: Some(upstream.url("/trigger")),
        ..file_config(&file)
    };
    let (app, calls) = gated_app(&config);

    let response = send(&app, request_from("203.0.113.7:54321")).await;

    assert_eq!(body_string(response).await, "<h1>down</h1>");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_trigger_non_200_forwards() {
    let upstream = Upstream::start().await;
    upstream.set_trigger(503);
    let file = maintenance_file("<h1>down</h1>");
    let config = MaintenanceConfig {
        trigger_url: Some(upstream.url("/trigger")),
        ..file_config(&file)
    };
    let (app, calls) = gated_app(&config);

    let response = send(&app, request_from("203.0.113.7:54321")).await;

    assert_eq!(body_string(response).await, NEXT_BODY);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_trigger_toggles_without_restart() {
    let upstream = Upstream::start().await;
    let file = maintenance_file("<h1>down</h1>");
    let config = MaintenanceConfig {
        trigger_url: Some(upstream.url("/trigger")),
        ..file_config(&file)
    };
    let (app, calls) = gated_app(&config);

    upstream.set_trigger(404);
    let response = send(&app, request_from("203.0.113.7:54321")).await;
    assert_eq!(body_string(response).await, NEXT_BODY);

    upstream.set_trigger(200);
    let response = send(&app, request_from("203.0.113.7:54321")).await;
    assert_eq!(body_string(response).await, "<h1>down</h1>");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_trigger_unreachable_forwards() {
    let file = maintenance_file("<h1>down</h1>");
    let config = MaintenanceConfig {
        trigger_url: Some("http://127.0.0.1:9/trigger".to_string()),
        upstream_timeout_ms: 1000,
        ..file_config(&file)
    };
    let (app, calls) = gated_app(&config);

    let response = send(&app, request_from("203.0.113.7:54321")).await;

    assert_eq!(body_string(response).await, NEXT_BODY);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Remote Source
// ============================================================================

#[tokio::test]
async fn test_remote_source_served() {
    let upstream = Upstream::start().await;
    let config = MaintenanceConfig {
        enabled: true,
        source: upstream.url("/page"),
        trigger_url: Some(upstream.url("/trigger")),
        response_status_code: 503,
        response_content_type: "text/plain".to_string(),
        ..MaintenanceConfig::default()
    };
    let (app, calls) = gated_app(&config);

    let response = send(&app, request_from("203.0.113.7:54321")).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
    assert_eq!(body_string(response).await, "maintenance");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_remote_source_non_200_forwards() {
    let upstream = Upstream::start().await;
    let config = MaintenanceConfig {
        enabled: true,
        source: upstream.url("/unavailable"),
        trigger_url: Some(upstream.url("/trigger")),
        ..MaintenanceConfig::default()
    };
    let (app, calls) = gated_app(&config);

    let response = send(&app, request_from("203.0.113.7:54321")).await;

    assert_eq!(body_string(response).await, NEXT_BODY);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_remote_source_unreachable_forwards() {
    let upstream = Upstream::start().await;
    let config = MaintenanceConfig {
        enabled: true,
        source: "http://127.0.0.1:9/page".to_string(),
        trigger_url: Some(upstream.url("/trigger")),
        upstream_timeout_ms: 1000,
        ..MaintenanceConfig::default()
    };
    let (app, calls) = gated_app(&config);

    let response = send(&app, request_from("203.0.113.7:54321")).await;

    assert_eq!(body_string(response).await, NEXT_BODY);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Whitelist
// ============================================================================

#[tokio::test]
async fn test_whitelisted_peer_forwards() {
    let file = maintenance_file("<h1>down</h1>");
    let config = MaintenanceConfig {
        whitelist_cidrs: vec!["192.168.0.0/16".to_string(), "203.0.113.0/24".to_string()],
        ..file_config(&file)
    };
    let (app, calls) = gated_app(&config);

    let response = send(&app, request_from("203.0.113.7:54321")).await;

    assert_eq!(body_string(response).await, NEXT_BODY);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_whitelisted_forwarded_for_forwards() {
    let file = maintenance_file("<h1>down</h1>");
    let config = MaintenanceConfig {
        whitelist_cidrs: vec!["10.0.0.0/8".to_string()],
        ..file_config(&file)
    };
    let (app, calls) = gated_app(&config);

    let mut req = request_from("198.51.100.1:40000");
    req.headers_mut()
        .insert("x-forwarded-for", "10.0.0.5, 9.9.9.9".parse().unwrap());
    let response = send(&app, req).await;

    assert_eq!(body_string(response).await, NEXT_BODY);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_non_whitelisted_caller_sees_page() {
    let file = maintenance_file("<h1>down</h1>");
    let config = MaintenanceConfig {
        whitelist_cidrs: vec!["10.0.0.0/8".to_string()],
        ..file_config(&file)
    };
    let (app, calls) = gated_app(&config);

    let mut req = request_from("10.0.0.1:40000");
    // Forwarded header wins over the (whitelisted) peer address
    req.headers_mut()
        .insert("x-real-ip", "9.9.9.9".parse().unwrap());
    let response = send(&app, req).await;

    assert_eq!(body_string(response).await, "<h1>down</h1>");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_whitelist_fails_construction() {
    let file = maintenance_file("<h1>down</h1>");
    let config = MaintenanceConfig {
        whitelist_cidrs: vec!["10.0.0.0/40".to_string()],
        ..file_config(&file)
    };

    let err = MaintenanceLayer::new(&config, "test").unwrap_err();
    assert!(matches!(err, AppError::ConfigError(ref msg) if msg.contains("10.0.0.0/40")));
}

// ============================================================================
// Host Router
// ============================================================================

fn host_router(maintenance: MaintenanceConfig) -> Router {
    let config = Config {
        maintenance,
        ..Config::default()
    };
    build_router(AppState::new(config).unwrap())
}

#[tokio::test]
async fn test_health_not_intercepted() {
    let file = maintenance_file("<h1>down</h1>");
    let app = host_router(file_config(&file));

    let response = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["maintenance_active"], true);

    let response = send(&app, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, Request::get("/anything").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_string(response).await, "<h1>down</h1>");
}

#[tokio::test]
async fn test_application_reached_when_inactive() {
    let app = host_router(MaintenanceConfig {
        enabled: false,
        source: "/var/www/maintenance.html".to_string(),
        ..MaintenanceConfig::default()
    });

    let response = send(&app, Request::get("/orders/42").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response).await,
        "application is serving /orders/42\n"
    );
}

#[tokio::test]
async fn test_client_deadline_bounds_trigger_check() {
    let upstream = Upstream::start().await;
    let file = maintenance_file("<h1>down</h1>");
    let app = host_router(MaintenanceConfig {
        trigger_url: Some(upstream.url("/slow")),
        upstream_timeout_ms: 10_000,
        ..file_config(&file)
    });

    let started = Instant::now();
    let response = send(
        &app,
        Request::get("/orders")
            .header("x-request-timeout", "200")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    // Trigger timed out after the client's 200ms, so the request was forwarded
    assert_eq!(body_string(response).await, "application is serving /orders\n");
    assert!(started.elapsed() < Duration::from_secs(2));
}
