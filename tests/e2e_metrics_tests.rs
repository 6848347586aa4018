//! End-to-end tests for the metrics endpoint
//!
//! Kept in their own test binary: the metrics registry is process-wide, so
//! gauges are only predictable when no other test shares the process.

mod common;

use axum::{body::Body, http::Request};
use common::{TestClient, TestServer, HAPPY_GENERATION};
use moodmix_server::server::make_metrics_app;
use moodmix_server::server::metrics::{init_metrics, CACHE_ENTRIES};
use reqwest::StatusCode;
use tower::ServiceExt;

#[tokio::test]
async fn test_cache_size_gauge_follows_inserts() {
    init_metrics();
    let server = TestServer::spawn().await;
    server.upstreams.set_generation(HAPPY_GENERATION);
    let client = TestClient::new(server.base_url.clone());

    for mood in ["happy", "sad"] {
        let response = client.get_recommendations(mood, "rock").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(CACHE_ENTRIES.get(), 2.0);

    let response = make_metrics_app()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("moodmix_cache_entries 2"), "{}", text);
}
