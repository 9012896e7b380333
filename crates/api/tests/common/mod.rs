//! Common test utilities for integration tests.
//!
//! The app under test runs against `MemoryClubStore`, so no database is
//! needed.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use club_registration_api::{app::create_app, config::Config};
use persistence::store::MemoryClubStore;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Bootstrap admin code from `Config::load_for_test`.
pub const ADMIN_CODE: &str = "246810";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryClubStore>,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    Config::load_for_test(overrides).expect("Failed to build test config")
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(MemoryClubStore::new(), &[])
}

pub fn spawn_app_with(store: MemoryClubStore, overrides: &[(&str, &str)]) -> TestApp {
    let store = Arc::new(store);
    let router = create_app(test_config(overrides), store.clone());
    TestApp { router, store }
}

/// Audit writes run on background tasks; give them a moment to land.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn json_request_with_auth(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn get_request_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn delete_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Logs in with [`ADMIN_CODE`] and returns the session token.
pub async fn login(app: &TestApp) -> String {
    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/admin/login",
            serde_json::json!({ "code": ADMIN_CODE }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    body["token"].as_str().expect("token in login response").to_string()
}

/// Submits names for next week and returns the response body.
pub async fn submit(app: &TestApp, names: &[&str]) -> (StatusCode, serde_json::Value) {
    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/registrations",
            serde_json::json!({ "players": names }),
        ))
        .await;
    let status = response.status();
    (status, parse_response_body(response).await)
}
