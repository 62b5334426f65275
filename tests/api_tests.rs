//! Router-level integration tests
//!
//! Exercises the routes that do not need the external catalog: health and
//! the visualization event stream.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chaser::affinity::AffinityCache;
use chaser::catalog::CatalogClient;
use chaser::config::Config;
use chaser::video::VideoResolver;
use chaser::viz::CaptureConfig;
use chaser::{build_router, AppState};
use futures::StreamExt;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot`

/// Test helper: app state with dummy credentials and a capture command that
/// exits immediately (forcing the synthetic fallback path)
fn test_state() -> AppState {
    let config = Arc::new(Config {
        client_id: "test-id".to_string(),
        client_secret: "test-secret".to_string(),
        port: 0,
        cache_path: PathBuf::from("chaser.cache"),
        target_artist: "femtanyl".to_string(),
        capture: CaptureConfig {
            command: "true".to_string(),
            frame_rate: 60,
        },
    });

    let catalog = Arc::new(
        CatalogClient::new(
            "test-id".to_string(),
            "test-secret".to_string(),
            "femtanyl".to_string(),
        )
        .unwrap(),
    );
    let resolver = Arc::new(VideoResolver::new("femtanyl".to_string()).unwrap());
    let cache = Arc::new(AffinityCache::sentinel_only("femtanyl"));

    AppState::new(config, catalog, resolver, cache)
}

fn test_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_module() {
    let app = build_router(test_state());

    let response = app.oneshot(test_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "chaser");
    assert_eq!(body["target_artist"], "femtanyl");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn visualization_is_an_event_stream() {
    let app = build_router(test_state());

    let response = app.oneshot(test_request("/visualization")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(
        content_type.starts_with("text/event-stream"),
        "content-type was {}",
        content_type
    );
}

#[tokio::test]
async fn visualization_pushes_fallback_samples() {
    let app = build_router(test_state());

    let response = app.oneshot(test_request("/visualization")).await.unwrap();
    let mut body = response.into_body().into_data_stream();

    // Accumulate until one complete SSE event arrived
    let mut buffer = String::new();
    let event = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let chunk = body.next().await.expect("body ended").expect("body error");
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            if buffer.contains("\n\n") {
                return buffer.clone();
            }
        }
    })
    .await
    .expect("no event within timeout");

    assert!(event.contains("event: sample"), "event was: {}", event);
    let data_line = event
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .expect("missing data line");
    let sample: Value = serde_json::from_str(data_line).unwrap();

    assert_eq!(sample["fallback"], true);
    let left = sample["left"].as_f64().unwrap();
    let right = sample["right"].as_f64().unwrap();
    assert!((5.0..=100.0).contains(&left));
    assert!((5.0..=100.0).contains(&right));
    assert!(sample["timestamp"].as_f64().is_some());
    assert!(sample.get("base_level").is_none());
}
