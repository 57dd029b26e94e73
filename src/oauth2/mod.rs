// ABOUTME: OAuth 2.1 client-side protocol support for the PKCE login flow
// ABOUTME: PKCE generation, wire models, and the authorization-server HTTP client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

//! OAuth 2.1 Authorization Code + PKCE client
//!
//! The bridge acts as a public client: it never holds a client secret, and
//! the PKCE verifier is the only proof binding the authorization code to
//! this flow instance.

/// Authorization-server HTTP client (authorize URL, exchange, introspection)
pub mod client;

/// Wire-format models for token and introspection responses
pub mod models;

/// PKCE verifier and challenge generation
pub mod pkce;

pub use client::{AuthServerClient, ExchangeError, IntrospectionError};
pub use models::{Introspection, TokenSet};
pub use pkce::PkceParams;
