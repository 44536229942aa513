//! Request Size Tests

use axum::{
    body::Body,
    http::{header, Method, StatusCode},
};
use pretty_assertions::assert_eq;

use crate::common::{body_json, TestApp};

fn small_limit() -> TestApp {
    TestApp::with_settings(|s| {
        s.csrf.enabled = false;
        s.limits.max_body_bytes = 64;
    })
}

#[tokio::test]
async fn test_declared_oversize_rejected() {
    let app = small_limit();
    let payload = format!(r#"{{"note":"{}"}}"#, "x".repeat(200));

    let response = app
        .send(
            app.request(Method::POST, "/api/v1/pickups")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, payload.len())
                .body(Body::from(payload))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_undeclared_oversize_json_rejected() {
    let app = small_limit();
    let payload = format!(r#"{{"note":"{}"}}"#, "x".repeat(200));

    let response = app.post_json("/api/v1/pickups", &payload).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_within_limit_accepted() {
    let app = small_limit();
    let response = app.post_json("/api/v1/pickups", r#"{"note":"ok"}"#).await;
    assert_eq!(response.status(), StatusCode::OK);
}
