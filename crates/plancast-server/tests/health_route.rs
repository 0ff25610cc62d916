//! Integration test for the health route.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use plancast_server::{config::Config, routes, state::AppState};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> Router {
    let state = Arc::new(AppState::new(Config::default()));
    Router::new()
        .route("/api/health", get(routes::health))
        .with_state(state)
}

#[tokio::test]
async fn test_health_reports_ok_and_session_count() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["sessions"], 0);
}
