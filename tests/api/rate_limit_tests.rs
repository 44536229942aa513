//! Rate Limiting Tests

use axum::{
    body::Body,
    http::{header, Method, StatusCode},
};
use fake::{faker::internet::en::IPv4, Fake};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{bearer_token, body_json, TestApp, CORRECT_PASSWORD};

async fn login(app: &TestApp, password: &str) -> axum::response::Response {
    let body = json!({"phone": "+15550100", "password": password}).to_string();
    app.send(
        app.request(Method::POST, "/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, "agentX")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

fn without_csrf() -> TestApp {
    TestApp::with_settings(|s| s.csrf.enabled = false)
}

#[tokio::test]
async fn test_auth_limit_counts_failed_logins() {
    let mut app = without_csrf();
    app.client_ip = "1.2.3.4".into();

    for _ in 0..5 {
        assert_eq!(login(&app, "wrong").await.status(), StatusCode::UNAUTHORIZED);
    }

    let response = login(&app, CORRECT_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().get(header::RETRY_AFTER).is_some());
    assert_eq!(
        body_json(response).await,
        json!({
            "success": false,
            "error": "Too many authentication attempts, please try again later."
        })
    );

    let now = chrono::Utc::now();
    assert_eq!(app.state.limiters.auth.status_at("1.2.3.4:agentX", now).remaining, 0);
}

#[tokio::test]
async fn test_successful_logins_not_counted() {
    let mut app = without_csrf();
    app.client_ip = "1.2.3.4".into();

    for _ in 0..10 {
        assert_eq!(login(&app, CORRECT_PASSWORD).await.status(), StatusCode::OK);
    }
    for _ in 0..5 {
        assert_eq!(login(&app, "wrong").await.status(), StatusCode::UNAUTHORIZED);
    }
    assert_eq!(
        login(&app, "wrong").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_auth_key_includes_user_agent() {
    let app = without_csrf();

    for _ in 0..5 {
        login(&app, "wrong").await;
    }

    // Same address, different agent: separate counter
    let response = app
        .send(
            app.request(Method::POST, "/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::USER_AGENT, "agentY")
                .body(Body::from(r#"{"password":"wrong"}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_general_limit_skips_health() {
    let mut app = TestApp::with_settings(|s| s.rate_limit.general.max_requests = 3);
    app.client_ip = IPv4().fake();

    for _ in 0..10 {
        assert_eq!(app.get("/health").await.status(), StatusCode::OK);
    }
    for _ in 0..3 {
        assert_eq!(app.get("/api/v1/pickups").await.status(), StatusCode::OK);
    }

    let response = app.get("/api/v1/pickups").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body_json(response).await["error"],
        "Too many requests from this IP, please try again later."
    );

    // Another client is unaffected
    app.client_ip = "198.51.100.1".into();
    assert_eq!(app.get("/api/v1/pickups").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admitted_responses_carry_headers() {
    let app = TestApp::new();
    let response = app.get("/api/v1/search/recyclers?q=glass").await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "30");
    assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "29");
    assert!(headers.get("x-ratelimit-reset").is_some());
}

#[tokio::test]
async fn test_search_limit() {
    let app = TestApp::with_settings(|s| s.rate_limit.search.max_requests = 2);

    assert_eq!(app.get("/api/v1/search/recyclers").await.status(), StatusCode::OK);
    assert_eq!(app.get("/api/v1/search/recyclers").await.status(), StatusCode::OK);

    let response = app.get("/api/v1/search/recyclers").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "2");

    // Other endpoint classes keep their own budget
    assert_eq!(app.get("/api/v1/pickups").await.status(), StatusCode::OK);
}

async fn pay(app: &TestApp, user: Option<&str>) -> axum::response::Response {
    let mut builder = app.request(Method::POST, "/api/v1/payments/intent");
    if let Some(user) = user {
        builder = builder.header(
            header::AUTHORIZATION,
            format!("Bearer {}", bearer_token(user)),
        );
    }
    app.send(builder.body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn test_payment_limit_keyed_by_user() {
    let app = without_csrf();

    for _ in 0..3 {
        let response = pay(&app, Some("alice")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["payer"], "alice");
    }
    assert_eq!(
        pay(&app, Some("alice")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    // Same address, different user
    assert_eq!(pay(&app, Some("bob")).await.status(), StatusCode::CREATED);

    // Anonymous callers fall back to the address
    let response = pay(&app, None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["payer"], json!(null));
}

async fn get_forwarded(app: &TestApp, forwarded_for: &str) -> axum::response::Response {
    app.send(
        app.request(Method::GET, "/api/v1/pickups")
            .header("x-forwarded-for", forwarded_for)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn test_forwarded_header_ignored_without_trust_proxy() {
    let app = TestApp::with_settings(|s| s.rate_limit.general.max_requests = 3);

    for i in 0..3 {
        let response = get_forwarded(&app, &format!("10.0.0.{}", i)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // A fresh forwarded address does not open a fresh window
    let response = get_forwarded(&app, "10.0.0.99").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let now = chrono::Utc::now();
    assert_eq!(app.state.limiters.general.status_at(&app.client_ip, now).remaining, 0);
}

#[tokio::test]
async fn test_forwarded_header_honored_with_trust_proxy() {
    let app = TestApp::with_settings(|s| {
        s.server.trust_proxy = true;
        s.rate_limit.general.max_requests = 1;
    });

    assert_eq!(get_forwarded(&app, "10.0.0.1").await.status(), StatusCode::OK);
    assert_eq!(
        get_forwarded(&app, "10.0.0.1, 172.16.0.1").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(get_forwarded(&app, "10.0.0.2").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_remaining_reflects_returned_slot() {
    let app = without_csrf();

    let response = login(&app, CORRECT_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "5");
    assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "5");

    let response = login(&app, "wrong").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "4");
}

#[tokio::test]
async fn test_payment_history_requires_identity() {
    let app = TestApp::new();

    let response = app.get("/api/v1/payments/history").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["success"], false);

    let response = app
        .send(
            app.request(Method::GET, "/api/v1/payments/history")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", bearer_token("carol")),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["payer"], "carol");
}
