// ABOUTME: Application constants and default configuration values
// ABOUTME: Centralizes env var names, OAuth protocol constants, and storage keys
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

//! Application-wide constants grouped by concern

/// OAuth 2.1 protocol constants
pub mod oauth {
    /// Character set permitted in a PKCE code verifier (RFC 7636 unreserved set)
    pub const VERIFIER_CHARSET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

    /// Minimum code verifier length (RFC 7636)
    pub const VERIFIER_MIN_LENGTH: usize = 43;

    /// Maximum code verifier length (RFC 7636)
    pub const VERIFIER_MAX_LENGTH: usize = 128;

    /// Default code verifier length used by the redirector
    pub const VERIFIER_DEFAULT_LENGTH: usize = 64;

    /// Length of the anti-CSRF state token
    pub const STATE_TOKEN_LENGTH: usize = 32;

    /// The only challenge method this client emits
    pub const CHALLENGE_METHOD_S256: &str = "S256";

    /// Grant type for the authorization-code exchange
    pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
}

/// Fixed logical keys in the ephemeral per-attempt state store
pub mod storage_keys {
    /// Key holding the PKCE code verifier between redirect and callback
    pub const PKCE_VERIFIER: &str = "pkce_code_verifier";

    /// Key holding the anti-CSRF state token between redirect and callback
    pub const OAUTH_STATE: &str = "oauth_state";
}

/// Environment variable names read by `ServerConfig::from_env`
pub mod env_config {
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";

    /// Base URL of the Hanko authorization server
    pub const AUTH_BASE_URL: &str = "AUTH_BASE_URL";

    /// Override for the authorize endpoint (defaults to `{base}/authorize`)
    pub const AUTH_AUTHORIZE_URL: &str = "AUTH_AUTHORIZE_URL";

    /// Override for the token endpoint (defaults to `{base}/token`)
    pub const AUTH_TOKEN_URL: &str = "AUTH_TOKEN_URL";

    /// Override for the introspection endpoint (defaults to `{base}/introspect`)
    pub const AUTH_INTROSPECT_URL: &str = "AUTH_INTROSPECT_URL";

    /// Public OAuth client identifier
    pub const AUTH_CLIENT_ID: &str = "AUTH_CLIENT_ID";

    /// Redirect URI registered with the authorization server
    pub const AUTH_REDIRECT_URI: &str = "AUTH_REDIRECT_URI";

    /// Space-separated scope list requested at authorization time
    pub const AUTH_SCOPES: &str = "AUTH_SCOPES";

    /// Base URL of the Supabase project holding user records
    pub const SUPABASE_URL: &str = "SUPABASE_URL";

    /// Service-role key for the Supabase admin user API
    pub const SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

    /// Comma-separated allowed CORS origins (`*` for any)
    pub const CORS_ORIGINS: &str = "CORS_ORIGINS";
}

/// Default values applied when environment variables are absent
pub mod defaults {
    /// Default HTTP listen port
    pub const HTTP_PORT: u16 = 8080;

    /// Default authorization server base for local development
    pub const AUTH_BASE_URL: &str = "http://localhost:8000";

    /// Default redirect URI for local development
    pub const AUTH_REDIRECT_URI: &str = "http://localhost:3000/auth/callback";

    /// Default requested scopes
    pub const AUTH_SCOPES: &str = "openid email profile";

    /// Default CORS policy
    pub const CORS_ORIGINS: &str = "*";
}

/// Network timeouts in seconds
pub mod network {
    /// Request timeout for OAuth endpoints (exchanges should be fast)
    pub const OAUTH_REQUEST_TIMEOUT_SECS: u64 = 15;

    /// Connect timeout for OAuth endpoints
    pub const OAUTH_CONNECT_TIMEOUT_SECS: u64 = 5;

    /// Request timeout for general API calls (user-store admin API)
    pub const API_REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Connect timeout for general API calls
    pub const API_CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Whole-request timeout applied by the router's timeout layer
    pub const ROUTE_TIMEOUT_SECS: u64 = 30;
}

/// Service identity for logs
pub mod service {
    /// Service name reported in structured logs
    pub const NAME: &str = "passlink";
}
