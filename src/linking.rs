// ABOUTME: Identity linking between the passkey provider's subject and local user records
// ABOUTME: Introspects the access token, verifies the claimed subject, and resolves/creates the record
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

//! Identity linker
//!
//! Associates an external identity-provider subject with a local user
//! record. The caller's claimed identity is never trusted directly: the
//! access token is introspected and the verified subject must match the
//! claim exactly before any record is touched.

use crate::errors::{AppError, ErrorCode};
use crate::logging::AppLogger;
use crate::oauth2::client::IntrospectionError;
use crate::oauth2::{AuthServerClient, Introspection};
use crate::users::{UserStore, UserStoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// The identity a caller claims to hold, to be verified via introspection
#[derive(Debug, Clone)]
pub struct CandidateIdentity {
    /// Claimed external subject identifier
    pub external_id: String,
    /// Claimed email address
    pub email: String,
    /// Local user id the caller believes it already maps to, if any
    pub current_local_id: Option<Uuid>,
}

/// Failures during identity linking
#[derive(Debug, Error)]
pub enum LinkError {
    /// Introspection reported the token as inactive
    #[error("access token is not active")]
    TokenInactive,
    /// Verified subject differs from the claimed one; possible spoofing
    #[error("verified subject does not match claimed identity")]
    SubjectMismatch {
        /// Subject recovered from introspection
        verified: String,
        /// Subject the caller claimed
        claimed: String,
    },
    /// Introspection endpoint unreachable
    #[error("introspection unreachable: {0}")]
    IntrospectionUnreachable(String),
    /// Introspection response unreadable
    #[error("introspection malformed: {0}")]
    IntrospectionMalformed(String),
    /// Create reported a duplicate but the follow-up lookup found nothing
    #[error("user store inconsistent: {0}")]
    StoreInconsistent(String),
    /// Store backend failure
    #[error(transparent)]
    Store(#[from] UserStoreError),
}

impl From<IntrospectionError> for LinkError {
    fn from(error: IntrospectionError) -> Self {
        match error {
            IntrospectionError::Transport(msg) => Self::IntrospectionUnreachable(msg),
            IntrospectionError::Malformed(msg) => Self::IntrospectionMalformed(msg),
        }
    }
}

impl From<LinkError> for AppError {
    fn from(error: LinkError) -> Self {
        let message = error.to_string();
        let code = match &error {
            LinkError::TokenInactive => ErrorCode::TokenInactive,
            LinkError::SubjectMismatch { .. } => ErrorCode::SubjectMismatch,
            LinkError::IntrospectionUnreachable(_) | LinkError::IntrospectionMalformed(_) => {
                ErrorCode::UpstreamMalformed
            }
            LinkError::StoreInconsistent(_) => ErrorCode::UserStoreInconsistent,
            LinkError::Store(UserStoreError::Transport(_)) => ErrorCode::UpstreamUnreachable,
            LinkError::Store(_) => ErrorCode::InternalError,
        };
        Self::new(code, message).with_source(error)
    }
}

/// Links verified external subjects to local user records
pub struct IdentityLinkService {
    auth: Arc<AuthServerClient>,
    users: Arc<dyn UserStore>,
}

impl IdentityLinkService {
    /// Create a linker over the authorization server and user store
    #[must_use]
    pub fn new(auth: Arc<AuthServerClient>, users: Arc<dyn UserStore>) -> Self {
        Self { auth, users }
    }

    /// Link using the token's own verified claims, with no caller-side claim
    /// to cross-check. Used right after a successful exchange, where only the
    /// token is in hand.
    ///
    /// # Errors
    ///
    /// Fails with [`LinkError::TokenInactive`] for inactive tokens or tokens
    /// carrying no email claim, plus the store variants.
    pub async fn link_verified(&self, access_token: &str) -> Result<Uuid, LinkError> {
        let active = match self.auth.introspect(access_token).await? {
            Introspection::Active(token) => token,
            Introspection::Inactive => return Err(LinkError::TokenInactive),
        };

        let Some(email) = active.email else {
            return Err(LinkError::IntrospectionMalformed(
                "active token carries no email claim".to_owned(),
            ));
        };

        let candidate = CandidateIdentity {
            external_id: active.subject,
            email,
            current_local_id: None,
        };
        let local_id = self.resolve_user(&candidate).await?;
        AppLogger::log_auth_event(&candidate.external_id, "identity_linked", true);
        Ok(local_id)
    }

    /// Verify the token, check the claimed subject, and resolve the local
    /// user record, creating or re-tagging it as needed.
    ///
    /// # Errors
    ///
    /// Fails with [`LinkError::TokenInactive`] for inactive tokens,
    /// [`LinkError::SubjectMismatch`] when the verified subject differs from
    /// the claim (no record is created or updated in either case), and store
    /// variants for backend failures.
    pub async fn link_identity(
        &self,
        access_token: &str,
        candidate: &CandidateIdentity,
    ) -> Result<Uuid, LinkError> {
        let active = match self.auth.introspect(access_token).await? {
            Introspection::Active(token) => token,
            Introspection::Inactive => return Err(LinkError::TokenInactive),
        };

        if active.subject != candidate.external_id {
            AppLogger::log_security_event(
                "subject_mismatch",
                "introspected subject differs from claimed identity",
                Some(&candidate.external_id),
            );
            return Err(LinkError::SubjectMismatch {
                verified: active.subject,
                claimed: candidate.external_id.clone(),
            });
        }

        let local_id = self.resolve_user(candidate).await?;

        if let Some(expected) = candidate.current_local_id {
            if expected != local_id {
                debug!(
                    expected = %expected,
                    resolved = %local_id,
                    "caller-supplied local user id differs from resolution"
                );
            }
        }

        AppLogger::log_auth_event(&candidate.external_id, "identity_linked", true);
        Ok(local_id)
    }

    /// Resolve by email, creating a pre-verified record when absent and
    /// updating the external tag when present.
    async fn resolve_user(&self, candidate: &CandidateIdentity) -> Result<Uuid, LinkError> {
        if let Some(existing) = self.users.find_by_email(&candidate.email).await? {
            self.users
                .set_external_id(existing.id, &candidate.external_id)
                .await?;
            info!(user_id = %existing.id, "re-linked existing user record");
            return Ok(existing.id);
        }

        match self
            .users
            .create_verified(&candidate.email, &candidate.external_id)
            .await
        {
            Ok(created) => {
                info!(user_id = %created.id, "created linked user record");
                Ok(created.id)
            }
            Err(UserStoreError::Duplicate(_)) => {
                // Lost a create race; the record should now be visible.
                match self.users.find_by_email(&candidate.email).await? {
                    Some(existing) => {
                        self.users
                            .set_external_id(existing.id, &candidate.external_id)
                            .await?;
                        Ok(existing.id)
                    }
                    None => Err(LinkError::StoreInconsistent(format!(
                        "create reported duplicate for {} but lookup found no record",
                        candidate.email
                    ))),
                }
            }
            Err(other) => Err(other.into()),
        }
    }
}
