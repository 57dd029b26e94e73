// ABOUTME: Integration tests for the HTTP API surface
// ABOUTME: Drives the router directly and asserts the wire contract status codes and bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use passlink::config::{AuthServerConfig, ServerConfig, UserStoreConfig};
use passlink::context::ServerResources;
use passlink::routes;
use passlink::users::memory::MemoryUserStore;
use passlink::users::UserStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ServerConfig {
    ServerConfig {
        http_port: 0,
        auth: AuthServerConfig {
            authorize_url: format!("{}/authorize", server.uri()),
            token_url: format!("{}/token", server.uri()),
            introspect_url: format!("{}/introspect", server.uri()),
            client_id: "test-client".into(),
            redirect_uri: "http://localhost:3000/auth/callback".into(),
            scopes: vec!["openid".into()],
        },
        user_store: UserStoreConfig {
            base_url: format!("{}/supabase", server.uri()),
            service_role_key: "service-role".into(),
        },
        cors_origins: vec!["*".into()],
    }
}

fn app_with_store(server: &MockServer, users: Arc<MemoryUserStore>) -> Router {
    let resources = Arc::new(ServerResources::with_user_store(
        config_for(server),
        users as Arc<dyn UserStore>,
    ));
    routes::router(resources)
}

fn app(server: &MockServer) -> Router {
    app_with_store(server, Arc::new(MemoryUserStore::new()))
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_request_with_bearer(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_token_endpoint_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "issued",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(json_request(
            "/api/auth/token",
            json!({ "code": "good-code", "codeVerifier": "the-verifier" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["access_token"], "issued");
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
async fn test_token_endpoint_rejects_empty_fields() {
    let server = MockServer::start().await;

    let response = app(&server)
        .oneshot(json_request(
            "/api/auth/token",
            json!({ "code": "", "codeVerifier": "v" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(&server)
        .oneshot(json_request(
            "/api/auth/token",
            json!({ "code": "c", "codeVerifier": "  " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "MISSING_REQUIRED_FIELD");
}

#[tokio::test]
async fn test_token_endpoint_relays_oauth_error_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "code expired"
        })))
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(json_request(
            "/api/auth/token",
            json!({ "code": "stale", "codeVerifier": "v" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_grant");
    assert_eq!(body["error_description"], "code expired");
}

#[tokio::test]
async fn test_token_endpoint_maps_malformed_upstream_to_502() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(json_request(
            "/api/auth/token",
            json!({ "code": "c", "codeVerifier": "v" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UPSTREAM_MALFORMED");
}

#[tokio::test]
async fn test_token_endpoint_maps_unreachable_upstream_to_503() {
    let server = MockServer::start().await;
    let mut config = config_for(&server);
    config.auth.token_url = "http://127.0.0.1:1/token".into();
    let resources = Arc::new(ServerResources::with_user_store(
        config,
        Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>,
    ));

    let response = routes::router(resources)
        .oneshot(json_request(
            "/api/auth/token",
            json!({ "code": "c", "codeVerifier": "v" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_link_endpoint_requires_bearer() {
    let server = MockServer::start().await;

    let response = app(&server)
        .oneshot(json_request(
            "/api/auth/link-supabase",
            json!({ "hankoUserId": "hanko-1", "hankoEmail": "a@example.test" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_link_endpoint_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/introspect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "active": true,
            "sub": "hanko-1"
        })))
        .mount(&server)
        .await;

    let users = Arc::new(MemoryUserStore::new());
    let response = app_with_store(&server, Arc::clone(&users))
        .oneshot(json_request_with_bearer(
            "/api/auth/link-supabase",
            "valid-token",
            json!({ "hankoUserId": "hanko-1", "hankoEmail": "new@example.test" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let created = users.find_by_email("new@example.test").await.unwrap().unwrap();
    assert_eq!(body["supabaseUserId"], created.id.to_string());
}

#[tokio::test]
async fn test_link_endpoint_rejects_subject_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/introspect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "active": true,
            "sub": "someone-else"
        })))
        .mount(&server)
        .await;

    let users = Arc::new(MemoryUserStore::new());
    let response = app_with_store(&server, Arc::clone(&users))
        .oneshot(json_request_with_bearer(
            "/api/auth/link-supabase",
            "valid-token",
            json!({ "hankoUserId": "hanko-1", "hankoEmail": "a@example.test" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "SUBJECT_MISMATCH");
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_link_endpoint_rejects_inactive_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/introspect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "active": false })))
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(json_request_with_bearer(
            "/api/auth/link-supabase",
            "revoked-token",
            json!({ "hankoUserId": "hanko-1", "hankoEmail": "a@example.test" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "TOKEN_INACTIVE");
}

#[tokio::test]
async fn test_link_endpoint_rejects_empty_claims() {
    let server = MockServer::start().await;

    let response = app(&server)
        .oneshot(json_request_with_bearer(
            "/api/auth/link-supabase",
            "token",
            json!({ "hankoUserId": "", "hankoEmail": "a@example.test" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = MockServer::start().await;

    let response = app(&server)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "passlink");
}

#[tokio::test]
async fn test_ready_endpoint_reports_upstreams() {
    let server = MockServer::start().await;

    let response = app(&server)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
    assert!(body["auth_server"]["token_url"]
        .as_str()
        .unwrap()
        .ends_with("/token"));
}
