// ABOUTME: HTTP route handlers and router assembly
// ABOUTME: Auth endpoints plus health probes, wrapped in trace/CORS/timeout layers

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

/// Token exchange and identity linking endpoints
pub mod auth;

/// Liveness and readiness probes
pub mod health;

use crate::constants::network;
use crate::context::ServerResources;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Assemble the application router over shared resources
pub fn router(resources: Arc<ServerResources>) -> Router {
    let cors = cors_layer(&resources.config.cors_origins);

    Router::new()
        .route("/api/auth/token", post(auth::exchange_token))
        .route("/api/auth/link-supabase", post(auth::link_supabase))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(
            network::ROUTE_TIMEOUT_SECS,
        )))
        .with_state(resources)
}

/// Build the CORS layer from the configured origin list; `*` allows any
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        base.allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        base.allow_origin(AllowOrigin::list(parsed))
    }
}
