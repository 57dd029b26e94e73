// ABOUTME: Token exchange and identity-linking route handlers
// ABOUTME: Validates input, delegates to the OAuth client and linker, maps failures to API errors

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

use crate::context::ServerResources;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::linking::CandidateIdentity;
use crate::oauth2::client::ExchangeError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Body of `POST /api/auth/token`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenExchangeRequest {
    /// Authorization code from the provider's redirect
    pub code: String,
    /// PKCE verifier generated at redirect time
    pub code_verifier: String,
}

/// Body of `POST /api/auth/link-supabase`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    /// Claimed external subject identifier
    pub hanko_user_id: String,
    /// Claimed email address
    pub hanko_email: String,
    /// Local user id the caller believes it already maps to
    #[serde(default)]
    pub current_supabase_user_id: Option<Uuid>,
}

/// Success body of `POST /api/auth/link-supabase`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    /// Always `true` on a 2xx response
    pub success: bool,
    /// Resolved local user id
    pub supabase_user_id: Uuid,
}

/// `POST /api/auth/token` - exchange an authorization code plus PKCE
/// verifier for a token set.
///
/// Protocol errors from the authorization server are relayed verbatim with
/// the upstream status; unreadable replies map to 502 and transport
/// failures to 503.
pub async fn exchange_token(
    State(resources): State<Arc<ServerResources>>,
    Json(request): Json<TokenExchangeRequest>,
) -> AppResult<Response> {
    if request.code.trim().is_empty() {
        return Err(AppError::missing_field("code"));
    }
    if request.code_verifier.trim().is_empty() {
        return Err(AppError::missing_field("codeVerifier"));
    }

    match resources
        .auth_client
        .exchange_code(&request.code, &request.code_verifier)
        .await
    {
        Ok(tokens) => Ok((StatusCode::OK, Json(tokens)).into_response()),
        Err(ExchangeError::Protocol {
            error,
            description,
            status,
        }) => {
            debug!(oauth_error = %error, status = %status, "token exchange rejected upstream");
            let body = json!({
                "error": error,
                "error_description": description,
            });
            Ok((status, Json(body)).into_response())
        }
        Err(e @ ExchangeError::Malformed(_)) => {
            Err(AppError::new(ErrorCode::UpstreamMalformed, e.to_string()).with_source(e))
        }
        Err(e @ ExchangeError::Transport(_)) => {
            Err(AppError::new(ErrorCode::UpstreamUnreachable, e.to_string()).with_source(e))
        }
    }
}

/// `POST /api/auth/link-supabase` - verify the bearer token and link the
/// claimed identity to a local user record
pub async fn link_supabase(
    State(resources): State<Arc<ServerResources>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<LinkRequest>,
) -> AppResult<Json<LinkResponse>> {
    let Some(TypedHeader(bearer)) = bearer else {
        return Err(AppError::new(
            ErrorCode::AuthRequired,
            "missing bearer token",
        ));
    };

    if request.hanko_user_id.trim().is_empty() {
        return Err(AppError::missing_field("hankoUserId"));
    }
    if request.hanko_email.trim().is_empty() {
        return Err(AppError::missing_field("hankoEmail"));
    }

    let candidate = CandidateIdentity {
        external_id: request.hanko_user_id,
        email: request.hanko_email,
        current_local_id: request.current_supabase_user_id,
    };

    let local_id = resources
        .linker
        .link_identity(bearer.token(), &candidate)
        .await?;

    Ok(Json(LinkResponse {
        success: true,
        supabase_user_id: local_id,
    }))
}
