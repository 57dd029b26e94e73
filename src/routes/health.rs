// ABOUTME: Liveness and readiness probe endpoints
// ABOUTME: Reports service identity and configured upstream endpoints

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

use crate::constants::service;
use crate::context::ServerResources;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// `GET /health` - liveness probe
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": service::NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /ready` - readiness probe; confirms upstream endpoints are configured
pub async fn readiness_check(State(resources): State<Arc<ServerResources>>) -> impl IntoResponse {
    Json(json!({
        "status": "ready",
        "auth_server": {
            "token_url": resources.config.auth.token_url,
            "introspect_url": resources.config.auth.introspect_url,
        },
        "user_store": {
            "base_url": resources.config.user_store.base_url,
        },
    }))
}
