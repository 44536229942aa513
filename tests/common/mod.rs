//! Common Test Utilities
//!
//! A `TestApp` wraps the full security pipeline around a small set of stub
//! business routes and drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{ConnectInfo, Path, Query},
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use pickup_server::config::Settings;
use pickup_server::presentation::http::routes::create_router;
use pickup_server::presentation::middleware::{AuthUser, Claims};
use pickup_server::startup::AppState;

pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const CORRECT_PASSWORD: &str = "correct-horse";

/// Test application builder
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub client_ip: String,
}

impl TestApp {
    /// Pipeline with default settings plus a JWT secret
    pub fn new() -> Self {
        Self::with_settings(|_| {})
    }

    /// Pipeline with adjusted settings
    pub fn with_settings(configure: impl FnOnce(&mut Settings)) -> Self {
        let mut settings = Settings::default();
        settings.jwt.secret = Some(JWT_SECRET.to_string());
        configure(&mut settings);

        let state = AppState::new(settings);
        let router = create_router(state.clone(), business_routes());

        Self {
            router,
            state,
            client_ip: "203.0.113.7".to_string(),
        }
    }

    /// Request builder pre-filled with the connection peer address
    pub fn request(&self, method: Method, uri: &str) -> axum::http::request::Builder {
        let peer = SocketAddr::new(self.client_ip.parse().unwrap(), 40000);
        Request::builder()
            .method(method)
            .uri(uri)
            .extension(ConnectInfo(peer))
    }

    /// Send a request through the pipeline
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> Response {
        self.send(self.request(Method::GET, uri).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: &str) -> Response {
        self.send(
            self.request(Method::POST, uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Fetch a CSRF token for `session`, returning (session id, token)
    pub async fn csrf_token(&self, session: Option<&str>) -> (String, String) {
        let mut builder = self.request(Method::GET, "/api/v1/csrf-token");
        if let Some(session) = session {
            builder = builder.header("x-session-id", session);
        }
        let response = self.send(builder.body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        (
            body["session_id"].as_str().unwrap().to_string(),
            body["csrf_token"].as_str().unwrap().to_string(),
        )
    }
}

/// Signed bearer token for `user_id`
pub fn bearer_token(user_id: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub async fn body_bytes(response: Response) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ============================================================================
// Stub business routes
// ============================================================================

fn business_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/search/recyclers", get(search))
        .route("/api/v1/payments/intent", post(create_payment))
        .route("/api/v1/payments/history", get(payment_history))
        .route("/api/v1/users/{name}", get(user_profile))
        .route("/api/v1/pickups", get(list_pickups).post(echo))
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] == CORRECT_PASSWORD {
        Json(json!({"success": true})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "error": "Invalid credentials"})),
        )
            .into_response()
    }
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Json<HashMap<String, String>> {
    Json(params)
}

async fn create_payment(user: Option<AuthUser>) -> Response {
    let payer = user.map(|u| u.user_id);
    (StatusCode::CREATED, Json(json!({"payer": payer}))).into_response()
}

async fn payment_history(user: AuthUser) -> Json<Value> {
    Json(json!({"payer": user.user_id, "payments": []}))
}

async fn user_profile(Path(name): Path<String>) -> Json<Value> {
    Json(json!({ "name": name }))
}

async fn list_pickups() -> Json<Value> {
    Json(json!({"pickups": []}))
}

/// Returns the body exactly as the handler received it
async fn echo(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}
