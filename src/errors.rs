// ABOUTME: Unified error handling with standard error codes and HTTP responses
// ABOUTME: Maps protocol, integrity, transport, and store failures to consistent API errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

//! # Unified Error Handling System
//!
//! Defines standard error codes and HTTP response formatting so every route
//! reports failures the same way. Module-level errors (`ExchangeError`,
//! `LinkError`, ...) convert into [`AppError`] at the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication (1000-1999)
    /// Bearer token missing from the request
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired = 1000,
    /// Token rejected by introspection (inactive, revoked, or unknown)
    #[serde(rename = "TOKEN_INACTIVE")]
    TokenInactive = 1001,

    // Validation (3000-3999)
    /// A required field is missing or empty
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 3000,

    // Flow integrity (4000-4999)
    /// Introspected subject does not match the caller-supplied identity
    #[serde(rename = "SUBJECT_MISMATCH")]
    SubjectMismatch = 4000,
    /// Callback event arrived in a state that does not accept it
    #[serde(rename = "FLOW_REJECTED")]
    FlowRejected = 4001,

    // Upstream services (5000-5999)
    /// Upstream response could not be parsed
    #[serde(rename = "UPSTREAM_MALFORMED")]
    UpstreamMalformed = 5000,
    /// Upstream endpoint could not be reached
    #[serde(rename = "UPSTREAM_UNREACHABLE")]
    UpstreamUnreachable = 5001,

    // Internal (9000-9999)
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// User-record store returned contradictory results
    #[serde(rename = "USER_STORE_INCONSISTENT")]
    UserStoreInconsistent = 9001,
    /// Configuration error
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 9002,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            Self::MissingRequiredField | Self::SubjectMismatch => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            Self::AuthRequired | Self::TokenInactive => StatusCode::UNAUTHORIZED,

            // 409 Conflict
            Self::FlowRejected => StatusCode::CONFLICT,

            // 502 Bad Gateway
            Self::UpstreamMalformed => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            Self::UpstreamUnreachable => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError | Self::UserStoreInconsistent | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::TokenInactive => "The provided access token is not active",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::SubjectMismatch => "Verified subject does not match the supplied identity",
            Self::FlowRejected => "The login flow cannot accept this event in its current state",
            Self::UpstreamMalformed => "An upstream service returned an unreadable response",
            Self::UpstreamUnreachable => "An upstream service is currently unreachable",
            Self::InternalError => "An internal server error occurred",
            Self::UserStoreInconsistent => "The user store returned inconsistent results",
            Self::ConfigError => "Configuration error encountered",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Missing or empty required field
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("Missing required field: {}", field.into()),
        )
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Body of a serialized error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message.clone(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let body = ErrorResponse::from(&self);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}
