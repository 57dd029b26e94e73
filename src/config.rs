// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

//! Environment-based configuration management for production deployment

use crate::constants::{defaults, env_config};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Complete server configuration loaded from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Authorization server (Hanko) endpoints and client settings
    pub auth: AuthServerConfig,
    /// User-record store (Supabase admin API) settings
    pub user_store: UserStoreConfig,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
}

/// Authorization server endpoints and public-client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthServerConfig {
    /// Authorize endpoint URL
    pub authorize_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Introspection endpoint URL
    pub introspect_url: String,
    /// Public OAuth client identifier
    pub client_id: String,
    /// Redirect URI used at authorization time and echoed at exchange time
    pub redirect_uri: String,
    /// Scopes requested at authorization time
    pub scopes: Vec<String>,
}

/// User-record store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStoreConfig {
    /// Supabase project base URL
    pub base_url: String,
    /// Service-role key for the admin user API
    pub service_role_key: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error when a numeric variable fails to parse or a required
    /// variable is missing in a context where no default applies
    pub fn from_env() -> Result<Self> {
        let http_port = env_var_or(env_config::HTTP_PORT, &defaults::HTTP_PORT.to_string())?
            .parse::<u16>()
            .context("Invalid HTTP_PORT value")?;

        let auth_base = env_var_or(env_config::AUTH_BASE_URL, defaults::AUTH_BASE_URL)?;
        let auth_base = auth_base.trim_end_matches('/');

        let auth = AuthServerConfig {
            authorize_url: env_var_or(
                env_config::AUTH_AUTHORIZE_URL,
                &format!("{auth_base}/authorize"),
            )?,
            token_url: env_var_or(env_config::AUTH_TOKEN_URL, &format!("{auth_base}/token"))?,
            introspect_url: env_var_or(
                env_config::AUTH_INTROSPECT_URL,
                &format!("{auth_base}/introspect"),
            )?,
            client_id: env::var(env_config::AUTH_CLIENT_ID)
                .context("AUTH_CLIENT_ID must be set")?,
            redirect_uri: env_var_or(
                env_config::AUTH_REDIRECT_URI,
                defaults::AUTH_REDIRECT_URI,
            )?,
            scopes: env_var_or(env_config::AUTH_SCOPES, defaults::AUTH_SCOPES)?
                .split_whitespace()
                .map(str::to_owned)
                .collect(),
        };

        let user_store = UserStoreConfig {
            base_url: env::var(env_config::SUPABASE_URL)
                .context("SUPABASE_URL must be set")?
                .trim_end_matches('/')
                .to_owned(),
            service_role_key: env::var(env_config::SUPABASE_SERVICE_ROLE_KEY)
                .context("SUPABASE_SERVICE_ROLE_KEY must be set")?,
        };

        let cors_origins = parse_origins(&env_var_or(
            env_config::CORS_ORIGINS,
            defaults::CORS_ORIGINS,
        )?);

        Ok(Self {
            http_port,
            auth,
            user_store,
            cors_origins,
        })
    }

    /// One-line configuration summary safe for logs (no secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} authorize={} token={} introspect={} client_id={} redirect_uri={} scopes=[{}] user_store={}",
            self.http_port,
            self.auth.authorize_url,
            self.auth.token_url,
            self.auth.introspect_url,
            self.auth.client_id,
            self.auth.redirect_uri,
            self.auth.scopes.join(" "),
            self.user_store.base_url,
        )
    }
}

/// Read an environment variable with a fallback default
fn env_var_or(name: &str, default: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Ok(default.to_owned()),
    }
}

/// Parse a comma-separated origin list
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
