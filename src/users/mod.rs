// ABOUTME: User-record store abstraction with pluggable backends
// ABOUTME: Defines the trait and record type backing identity linking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

//! User-record store
//!
//! The bridge never owns user records; it resolves and tags records held by
//! an external store. [`UserStore`] is the seam: production uses the
//! Supabase admin API backend, tests use the in-memory backend.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Supabase admin-API backed store
pub mod supabase;

/// In-memory store for tests and demos
pub mod memory;

pub use supabase::SupabaseAdminStore;

/// A local user record, distinct from the external identity it links to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Local user identifier
    pub id: Uuid,
    /// Primary email address
    pub email: String,
    /// External identity-provider subject this record is tagged with
    pub external_id: Option<String>,
    /// Whether the email was verified (always true for records the bridge
    /// creates, since the identity provider already verified it)
    pub email_verified: bool,
}

/// Failures surfaced by a user-record store backend
#[derive(Debug, Error)]
pub enum UserStoreError {
    /// A record with this email already exists
    #[error("user already exists: {0}")]
    Duplicate(String),
    /// The store rejected the request
    #[error("user store rejected request ({status}): {message}")]
    Api {
        /// HTTP status reported by the store
        status: u16,
        /// Store-supplied message
        message: String,
    },
    /// The store's response could not be parsed
    #[error("malformed user store response: {0}")]
    Malformed(String),
    /// The store could not be reached
    #[error("user store unreachable: {0}")]
    Transport(String),
}

/// Find/create/tag operations over an external user-record store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user record by exact email match
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UserStoreError>;

    /// Create a pre-verified user record tagged with the external subject
    async fn create_verified(
        &self,
        email: &str,
        external_id: &str,
    ) -> Result<UserRecord, UserStoreError>;

    /// Update an existing record's external-subject tag (supports re-linking)
    async fn set_external_id(&self, id: Uuid, external_id: &str) -> Result<(), UserStoreError>;
}
