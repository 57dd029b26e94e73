// ABOUTME: Integration tests for the authorization-server client
// ABOUTME: Exercises token exchange and introspection against a mocked upstream
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use passlink::config::AuthServerConfig;
use passlink::oauth2::client::ExchangeError;
use passlink::oauth2::{AuthServerClient, Introspection, PkceParams};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> AuthServerConfig {
    AuthServerConfig {
        authorize_url: format!("{}/authorize", server.uri()),
        token_url: format!("{}/token", server.uri()),
        introspect_url: format!("{}/introspect", server.uri()),
        client_id: "test-client".into(),
        redirect_uri: "http://localhost:3000/auth/callback".into(),
        scopes: vec!["openid".into(), "email".into()],
    }
}

#[test]
fn test_authorization_url_carries_pkce_and_state() {
    let config = AuthServerConfig {
        authorize_url: "https://auth.example.test/authorize".into(),
        token_url: "https://auth.example.test/token".into(),
        introspect_url: "https://auth.example.test/introspect".into(),
        client_id: "test-client".into(),
        redirect_uri: "http://localhost:3000/auth/callback".into(),
        scopes: vec!["openid".into(), "email".into()],
    };
    let client = AuthServerClient::new(config);
    let pkce = PkceParams::generate().unwrap();

    let url = client.authorization_url("state-token", &pkce).unwrap();

    assert!(url.starts_with("https://auth.example.test/authorize?"));
    assert!(url.contains("response_type=code"));
    assert!(url.contains("client_id=test-client"));
    assert!(url.contains("state=state-token"));
    assert!(url.contains(&format!("code_challenge={}", pkce.code_challenge)));
    assert!(url.contains("code_challenge_method=S256"));
    assert!(url.contains("scope=openid+email"));
    // The verifier itself never appears in the URL
    assert!(!url.contains(&pkce.code_verifier));
}

#[tokio::test]
async fn test_exchange_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=good-code"))
        .and(body_string_contains("code_verifier=the-verifier"))
        .and(body_string_contains("client_id=test-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "issued",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "openid"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AuthServerClient::new(config_for(&server));
    let tokens = client.exchange_code("good-code", "the-verifier").await.unwrap();

    assert_eq!(tokens.access_token, "issued");
    assert_eq!(tokens.token_type, "Bearer");
    assert!(tokens.expires_at.is_some());
}

#[tokio::test]
async fn test_exchange_never_sends_a_client_secret() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "issued"
        })))
        .mount(&server)
        .await;

    let client = AuthServerClient::new(config_for(&server));
    client.exchange_code("c", "v").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(!body.contains("client_secret"));
}

#[tokio::test]
async fn test_exchange_relays_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "code expired"
        })))
        .mount(&server)
        .await;

    let client = AuthServerClient::new(config_for(&server));
    let err = client.exchange_code("stale", "v").await.unwrap_err();

    let ExchangeError::Protocol {
        error,
        description,
        status,
    } = err
    else {
        panic!("expected protocol error");
    };
    assert_eq!(error, "invalid_grant");
    assert_eq!(description.as_deref(), Some("code expired"));
    assert_eq!(status.as_u16(), 400);
}

#[tokio::test]
async fn test_exchange_error_body_on_2xx_is_still_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "server_error"
        })))
        .mount(&server)
        .await;

    let client = AuthServerClient::new(config_for(&server));
    let err = client.exchange_code("c", "v").await.unwrap_err();

    let ExchangeError::Protocol { error, status, .. } = err else {
        panic!("expected protocol error");
    };
    assert_eq!(error, "server_error");
    assert_eq!(status.as_u16(), 400);
}

#[tokio::test]
async fn test_exchange_unparseable_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = AuthServerClient::new(config_for(&server));
    let err = client.exchange_code("c", "v").await.unwrap_err();
    assert!(matches!(err, ExchangeError::Malformed(_)));
}

#[tokio::test]
async fn test_exchange_unreachable_endpoint_is_transport() {
    let config = AuthServerConfig {
        authorize_url: "http://127.0.0.1:1/authorize".into(),
        token_url: "http://127.0.0.1:1/token".into(),
        introspect_url: "http://127.0.0.1:1/introspect".into(),
        client_id: "test-client".into(),
        redirect_uri: "http://localhost:3000/auth/callback".into(),
        scopes: vec!["openid".into()],
    };

    let client = AuthServerClient::new(config);
    let err = client.exchange_code("c", "v").await.unwrap_err();
    assert!(matches!(err, ExchangeError::Transport(_)));
}

#[tokio::test]
async fn test_introspect_active_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/introspect"))
        .and(body_string_contains("token=the-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "active": true,
            "sub": "subject-1",
            "email": "user@example.test",
            "scope": "openid"
        })))
        .mount(&server)
        .await;

    let client = AuthServerClient::new(config_for(&server));
    let result = client.introspect("the-token").await.unwrap();

    let Introspection::Active(token) = result else {
        panic!("expected active token");
    };
    assert_eq!(token.subject, "subject-1");
    assert_eq!(token.email.as_deref(), Some("user@example.test"));
}

#[tokio::test]
async fn test_introspect_inactive_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/introspect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "active": false })))
        .mount(&server)
        .await;

    let client = AuthServerClient::new(config_for(&server));
    let result = client.introspect("revoked").await.unwrap();
    assert!(matches!(result, Introspection::Inactive));
}
