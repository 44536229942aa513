//! CSRF Guard Tests

use axum::{
    body::Body,
    http::{Method, StatusCode},
};
use fake::{faker::lorem::en::Word, Fake};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{body_json, TestApp};

async fn post_pickup(app: &TestApp, session: Option<&str>, token: Option<&str>) -> axum::response::Response {
    let mut builder = app
        .request(Method::POST, "/api/v1/pickups")
        .header("content-type", "application/json");
    if let Some(session) = session {
        builder = builder.header("x-session-id", session);
    }
    if let Some(token) = token {
        builder = builder.header("x-csrf-token", token);
    }
    app.send(builder.body(Body::from(r#"{"material":"glass"}"#)).unwrap())
        .await
}

#[tokio::test]
async fn test_missing_token_rejected() {
    let app = TestApp::new();
    let response = post_pickup(&app, None, None).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await,
        json!({"success": false, "error": "CSRF token missing"})
    );
}

#[tokio::test]
async fn test_token_is_single_use() {
    let app = TestApp::new();
    let (session, token) = app.csrf_token(Some("s1")).await;
    assert_eq!(session, "s1");

    let first = post_pickup(&app, Some("s1"), Some(&token)).await;
    assert_eq!(first.status(), StatusCode::OK);

    let replay = post_pickup(&app, Some("s1"), Some(&token)).await;
    assert_eq!(replay.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(replay).await["error"], "CSRF token missing");
}

#[tokio::test]
async fn test_wrong_token_rejected() {
    let app = TestApp::new();
    let (session, token) = app.csrf_token(None).await;

    let response = post_pickup(&app, Some(&session), Some("forged")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Invalid CSRF token");

    // A mismatch does not burn the real token
    let response = post_pickup(&app, Some(&session), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_token_bound_to_session() {
    let app = TestApp::new();
    let session: String = Word().fake();
    let (_, token) = app.csrf_token(Some(&session)).await;
    let other = format!("{}-other", session);

    let response = post_pickup(&app, Some(&other), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_issue_mints_session() {
    let app = TestApp::new();
    let response = app.get("/api/v1/csrf-token").await;
    assert_eq!(response.status(), StatusCode::OK);

    let header_session = response
        .headers()
        .get("x-session-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let body = body_json(response).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["session_id"], header_session.as_str());
    assert_eq!(body["csrf_token"].as_str().unwrap().len(), 64);
    assert_eq!(body["expires_in"], 1800);
    assert!(app.state.csrf.contains(&header_session));
}

#[tokio::test]
async fn test_safe_methods_not_checked() {
    let app = TestApp::new();
    let response = app.get("/api/v1/pickups").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_exempt_path() {
    let app = TestApp::with_settings(|s| s.csrf.exempt_paths = vec!["/api/v1/pickups".into()]);
    let response = post_pickup(&app, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
