// ABOUTME: Wire-format models for authorization-server responses
// ABOUTME: Explicit success/error variants validated at the boundary before use
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// OAuth 2.0 token set held by an authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    /// Opaque bearer access token
    pub access_token: String,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// Token lifetime in seconds as reported by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    /// Absolute expiry, computed at issue time; `None` when no expiry is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Optional refresh token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Space-separated granted scopes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenSet {
    /// Build a token set from a successful token-endpoint body, computing the
    /// absolute expiry as issue time + `expires_in` seconds. Non-positive or
    /// non-numeric `expires_in` means no expiry is known.
    #[must_use]
    pub fn from_response(body: TokenResponseBody) -> Self {
        let expires_in = body.expires_in.filter(|&secs| secs > 0);
        let expires_at = expires_in.map(|secs| Utc::now() + Duration::seconds(secs));

        Self {
            access_token: body.access_token,
            token_type: body.token_type.unwrap_or_else(|| "Bearer".into()),
            expires_in,
            expires_at,
            refresh_token: body.refresh_token,
            scope: body.scope,
        }
    }

    /// Check if the token is expired; a token with no known expiry never is
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now())
    }
}

/// Raw token-endpoint reply, split into explicit variants before use.
///
/// A 2xx body carrying an `error` field is a protocol error, not a success,
/// so the error variant is tried first.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TokenEndpointReply {
    /// OAuth error body (`error`, optional `error_description`)
    Error(TokenErrorBody),
    /// Successful token grant
    Success(TokenResponseBody),
}

/// Successful token-endpoint body
#[derive(Debug, Deserialize)]
pub struct TokenResponseBody {
    /// The access token issued by the authorization server
    pub access_token: String,
    /// The type of token (usually "Bearer")
    pub token_type: Option<String>,
    /// Token lifetime in seconds; tolerates numeric strings and garbage
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub expires_in: Option<i64>,
    /// Refresh token for obtaining new access tokens
    pub refresh_token: Option<String>,
    /// Space-separated list of granted scopes
    pub scope: Option<String>,
}

/// OAuth protocol error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenErrorBody {
    /// OAuth error code (`invalid_grant`, `access_denied`, ...)
    pub error: String,
    /// Human-readable error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

/// Accept `expires_in` as a number or a numeric string; anything else maps to
/// "no expiry known" rather than failing the whole exchange.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

/// Raw introspection response body (RFC 7662)
#[derive(Debug, Deserialize)]
pub struct IntrospectionBody {
    /// Whether the token is currently active
    pub active: bool,
    /// Subject identifier of the token's holder
    pub sub: Option<String>,
    /// Space-separated scopes granted to the token
    pub scope: Option<String>,
    /// Expiry as a unix timestamp
    pub exp: Option<i64>,
    /// Issue time as a unix timestamp
    pub iat: Option<i64>,
    /// Email claim, when the server embeds it
    pub email: Option<String>,
    /// Any further custom claims
    #[serde(flatten)]
    pub claims: serde_json::Map<String, serde_json::Value>,
}

/// Validated introspection result
#[derive(Debug, Clone)]
pub enum Introspection {
    /// The token is active and describes a verified subject
    Active(ActiveToken),
    /// The token is inactive (expired, revoked, or unknown)
    Inactive,
}

/// Claims recovered from an active introspection response
#[derive(Debug, Clone)]
pub struct ActiveToken {
    /// Verified subject identifier
    pub subject: String,
    /// Email claim, when present
    pub email: Option<String>,
    /// Granted scopes
    pub scope: Option<String>,
}

impl IntrospectionBody {
    /// Collapse the raw body into an explicit variant.
    ///
    /// The subject comes from `sub`, falling back to an embedded `user_id`
    /// custom claim. An active token without any subject is unusable for
    /// identity linking and is treated as inactive.
    #[must_use]
    pub fn into_result(self) -> Introspection {
        if !self.active {
            return Introspection::Inactive;
        }

        let subject = self.sub.or_else(|| {
            self.claims
                .get("user_id")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        });

        match subject {
            Some(subject) => Introspection::Active(ActiveToken {
                subject,
                email: self.email,
                scope: self.scope,
            }),
            None => Introspection::Inactive,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_with_error_field_is_protocol_error() {
        let reply: TokenEndpointReply =
            serde_json::from_str(r#"{"error":"invalid_grant","error_description":"expired"}"#)
                .unwrap();
        assert!(matches!(reply, TokenEndpointReply::Error(e) if e.error == "invalid_grant"));
    }

    #[test]
    fn test_success_reply_parses() {
        let reply: TokenEndpointReply = serde_json::from_str(
            r#"{"access_token":"tok","token_type":"Bearer","expires_in":3600,"scope":"openid"}"#,
        )
        .unwrap();
        let TokenEndpointReply::Success(body) = reply else {
            panic!("expected success variant");
        };
        assert_eq!(body.expires_in, Some(3600));
    }

    #[test]
    fn test_lenient_expires_in() {
        let body: TokenResponseBody =
            serde_json::from_str(r#"{"access_token":"t","expires_in":"3600"}"#).unwrap();
        assert_eq!(body.expires_in, Some(3600));

        let body: TokenResponseBody =
            serde_json::from_str(r#"{"access_token":"t","expires_in":"soon"}"#).unwrap();
        assert_eq!(body.expires_in, None);
    }

    #[test]
    fn test_non_positive_expiry_means_unknown() {
        let body: TokenResponseBody =
            serde_json::from_str(r#"{"access_token":"t","expires_in":0}"#).unwrap();
        let tokens = TokenSet::from_response(body);
        assert!(tokens.expires_at.is_none());
        assert!(!tokens.is_expired());
    }

    #[test]
    fn test_expiry_computed_from_issue_time() {
        let body: TokenResponseBody =
            serde_json::from_str(r#"{"access_token":"t","expires_in":3600}"#).unwrap();
        let tokens = TokenSet::from_response(body);
        let expires_at = tokens.expires_at.unwrap();
        let delta = expires_at - Utc::now();
        assert!(delta > Duration::seconds(3590) && delta <= Duration::seconds(3600));
        assert!(!tokens.is_expired());
    }

    #[test]
    fn test_inactive_introspection() {
        let body: IntrospectionBody = serde_json::from_str(r#"{"active":false}"#).unwrap();
        assert!(matches!(body.into_result(), Introspection::Inactive));
    }

    #[test]
    fn test_active_introspection_custom_claim_fallback() {
        let body: IntrospectionBody =
            serde_json::from_str(r#"{"active":true,"user_id":"abc"}"#).unwrap();
        let Introspection::Active(token) = body.into_result() else {
            panic!("expected active variant");
        };
        assert_eq!(token.subject, "abc");
    }

    #[test]
    fn test_active_without_subject_is_unusable() {
        let body: IntrospectionBody = serde_json::from_str(r#"{"active":true}"#).unwrap();
        assert!(matches!(body.into_result(), Introspection::Inactive));
    }
}
