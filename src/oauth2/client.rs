// ABOUTME: HTTP client for the external authorization server
// ABOUTME: Builds authorize URLs, exchanges codes with PKCE, and introspects tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

use super::models::{Introspection, IntrospectionBody, TokenEndpointReply, TokenSet};
use super::pkce::PkceParams;
use crate::config::AuthServerConfig;
use crate::constants::oauth;
use crate::utils::http_client::oauth_client;
use http::StatusCode;
use thiserror::Error;
use url::Url;

/// Failures during the authorization-code exchange
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The authorization server returned an OAuth error body; code and
    /// description are relayed verbatim
    #[error("authorization server error: {error}")]
    Protocol {
        /// OAuth error code from the server
        error: String,
        /// Server-supplied description, when present
        description: Option<String>,
        /// Upstream HTTP status
        status: StatusCode,
    },
    /// The response body could not be parsed as either a token grant or an
    /// OAuth error
    #[error("malformed token endpoint response: {0}")]
    Malformed(String),
    /// The token endpoint could not be reached
    #[error("token endpoint unreachable: {0}")]
    Transport(String),
}

/// Failures during token introspection
#[derive(Debug, Error)]
pub enum IntrospectionError {
    /// The introspection response could not be parsed
    #[error("malformed introspection response: {0}")]
    Malformed(String),
    /// The introspection endpoint could not be reached
    #[error("introspection endpoint unreachable: {0}")]
    Transport(String),
}

/// Client for the external authorization server's `/authorize`, `/token`,
/// and `/introspect` endpoints
pub struct AuthServerClient {
    config: AuthServerConfig,
    client: reqwest::Client,
}

impl AuthServerClient {
    /// Create a new client with the given endpoint configuration
    #[must_use]
    pub fn new(config: AuthServerConfig) -> Self {
        Self {
            config,
            client: oauth_client(),
        }
    }

    /// Create a client with a caller-supplied HTTP client (shared pools)
    #[must_use]
    pub fn with_http_client(config: AuthServerConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Get the endpoint configuration
    #[must_use]
    pub const fn config(&self) -> &AuthServerConfig {
        &self.config
    }

    /// Build the authorize-endpoint URL for one authorization attempt
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorize URL is malformed
    pub fn authorization_url(&self, state: &str, pkce: &PkceParams) -> anyhow::Result<String> {
        let mut url =
            Url::parse(&self.config.authorize_url).map_err(|e| anyhow::anyhow!("invalid authorize URL: {e}"))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", &pkce.code_challenge_method);

        Ok(url.to_string())
    }

    /// Exchange an authorization code plus PKCE verifier for a token set
    ///
    /// No client secret is sent: this is a public-client flow, the verifier
    /// is the proof. The `redirect_uri` must equal the value used at
    /// redirect time.
    ///
    /// # Errors
    ///
    /// Protocol errors are relayed verbatim; unreadable bodies and network
    /// failures map to [`ExchangeError::Malformed`] and
    /// [`ExchangeError::Transport`] respectively.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, ExchangeError> {
        let params = [
            ("grant_type", oauth::GRANT_AUTHORIZATION_CODE),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let reply: TokenEndpointReply = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::Malformed(e.to_string()))?;

        match reply {
            TokenEndpointReply::Error(err) => Err(ExchangeError::Protocol {
                error: err.error,
                description: err.error_description,
                // A 2xx carrying an error body still fails; report it as 400
                status: if status.is_success() {
                    StatusCode::BAD_REQUEST
                } else {
                    status
                },
            }),
            TokenEndpointReply::Success(body) if status.is_success() => {
                Ok(TokenSet::from_response(body))
            }
            TokenEndpointReply::Success(_) => Err(ExchangeError::Malformed(format!(
                "token endpoint returned status {status} without an error body"
            ))),
        }
    }

    /// Introspect an access token (RFC 7662)
    ///
    /// # Errors
    ///
    /// Returns [`IntrospectionError::Transport`] when the endpoint is
    /// unreachable and [`IntrospectionError::Malformed`] when the body does
    /// not parse. An inactive token is a successful introspection.
    pub async fn introspect(&self, token: &str) -> Result<Introspection, IntrospectionError> {
        let params = [("token", token)];

        let response = self
            .client
            .post(&self.config.introspect_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| IntrospectionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IntrospectionError::Malformed(format!(
                "introspection endpoint returned status {}",
                response.status()
            )));
        }

        let body: IntrospectionBody = response
            .json()
            .await
            .map_err(|e| IntrospectionError::Malformed(e.to_string()))?;

        Ok(body.into_result())
    }
}
