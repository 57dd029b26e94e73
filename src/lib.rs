// ABOUTME: Library root for the passlink OAuth 2.1 PKCE login bridge
// ABOUTME: Exposes the flow, OAuth client, linker, user stores, and HTTP routes

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

//! # Passlink
//!
//! An OAuth 2.1 Authorization Code + PKCE login bridge. It drives the
//! redirect/callback flow against a passkey-first authorization server
//! (Hanko), exchanges authorization codes as a public client, and links the
//! verified identity to a user record in a Supabase project.
//!
//! The crate is split along the flow's seams:
//!
//! - [`oauth2`] - PKCE generation, wire models, and the authorization-server
//!   HTTP client
//! - [`flow`] - the explicit state machine, ephemeral per-attempt secrets,
//!   session persistence, and the [`flow::LoginFlow`] orchestrator
//! - [`linking`] - introspection-verified identity linking
//! - [`users`] - the user-record store trait and its Supabase backend
//! - [`routes`] - the axum HTTP surface for browser frontends

#![deny(unsafe_code)]

/// Environment-driven server configuration
pub mod config;

/// Application constants
pub mod constants;

/// Shared server resources
pub mod context;

/// Unified error handling
pub mod errors;

/// Login flow orchestration
pub mod flow;

/// Identity linking between provider subjects and user records
pub mod linking;

/// Structured logging setup
pub mod logging;

/// OAuth 2.1 client-side protocol support
pub mod oauth2;

/// HTTP route handlers
pub mod routes;

/// User-record stores
pub mod users;

/// Shared utilities
pub mod utils;
