// ABOUTME: Server binary entry point
// ABOUTME: Loads configuration, initializes logging, and serves the HTTP API

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

//! Passlink server binary

use anyhow::{Context, Result};
use clap::Parser;
use passlink::config::ServerConfig;
use passlink::context::ServerResources;
use passlink::logging;
use passlink::routes;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "passlink-server",
    about = "OAuth 2.1 PKCE login bridge linking passkey identities to user records",
    version
)]
struct Args {
    /// HTTP listen port (overrides HTTP_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;

    let args = Args::parse();

    let mut config = ServerConfig::from_env().context("failed to load configuration")?;
    if let Some(port) = args.port {
        config.http_port = port;
    }

    info!(config = %config.summary(), "configuration loaded");

    let port = config.http_port;
    let resources = Arc::new(ServerResources::new(config));
    let app = routes::router(resources);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install shutdown handler");
        return;
    }
    info!("shutdown signal received");
}
