// ABOUTME: Orchestration of the redirect/callback login flow
// ABOUTME: Drives the state machine, ephemeral store, and session through one attempt
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

//! Login flow orchestrator
//!
//! Ties together PKCE generation, the ephemeral per-attempt store, the
//! explicit state machine, and the session. One [`LoginFlow`] instance
//! corresponds to one browser/installation; a second callback for the same
//! attempt is rejected by the machine before any secret is consumed.

/// Explicit state machine for the callback flow
pub mod machine;

/// Session state and durable persistence
pub mod session;

/// Ephemeral single-use storage for per-attempt secrets
pub mod state_store;

pub use machine::{FlowEvent, FlowMachine, FlowState, TransitionRejected};
pub use session::{Session, SessionSnapshot, SessionStatus, SessionStore};
pub use state_store::EphemeralStateStore;

use crate::constants::storage_keys;
use crate::errors::{AppError, ErrorCode};
use crate::linking::{IdentityLinkService, LinkError};
use crate::logging::AppLogger;
use crate::oauth2::client::ExchangeError;
use crate::oauth2::pkce::{self, PkceParams};
use crate::oauth2::{AuthServerClient, TokenSet};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Seam to the authorization server, as the flow sees it
#[async_trait]
pub trait CodeExchanger: Send + Sync {
    /// Build the authorize-endpoint URL for one attempt
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorize URL is malformed
    fn authorization_url(&self, state: &str, pkce: &PkceParams) -> anyhow::Result<String>;

    /// Exchange an authorization code plus verifier for a token set
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, ExchangeError>;
}

#[async_trait]
impl CodeExchanger for AuthServerClient {
    fn authorization_url(&self, state: &str, pkce: &PkceParams) -> anyhow::Result<String> {
        Self::authorization_url(self, state, pkce)
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, ExchangeError> {
        Self::exchange_code(self, code, code_verifier).await
    }
}

/// Seam to identity linking; failures here never fail the login
#[async_trait]
pub trait SubjectLinker: Send + Sync {
    /// Resolve the local user for a freshly issued access token
    async fn link_verified(&self, access_token: &str) -> Result<Uuid, LinkError>;
}

#[async_trait]
impl SubjectLinker for IdentityLinkService {
    async fn link_verified(&self, access_token: &str) -> Result<Uuid, LinkError> {
        Self::link_verified(self, access_token).await
    }
}

/// Query parameters carried on the provider's redirect back to us
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code, present on success
    pub code: Option<String>,
    /// Echoed anti-CSRF state token
    pub state: Option<String>,
    /// OAuth error code, present when the provider denied the attempt
    pub error: Option<String>,
    /// Human-readable error description
    pub error_description: Option<String>,
}

impl CallbackParams {
    fn is_callback(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }
}

/// Result of handling one redirect
#[derive(Debug)]
pub enum FlowOutcome {
    /// The URL carried no callback parameters; nothing was done
    NoCallback,
    /// The machine rejected the callback (duplicate delivery or stale tab)
    Replayed,
    /// The attempt failed; the session is in the error state
    Failed {
        /// What went wrong, suitable for display
        message: String,
    },
    /// The exchange succeeded and the session is authenticated
    Authenticated {
        /// Local user id, when post-login linking succeeded
        local_user_id: Option<Uuid>,
        /// Linking failure, when it was attempted and failed (non-fatal)
        link_error: Option<String>,
    },
}

/// One browser/installation's login flow
pub struct LoginFlow {
    machine: FlowMachine,
    store: EphemeralStateStore,
    session: Session,
    exchanger: Arc<dyn CodeExchanger>,
    linker: Option<Arc<dyn SubjectLinker>>,
}

impl LoginFlow {
    /// Create a flow over an authorization-server seam and a session
    #[must_use]
    pub fn new(exchanger: Arc<dyn CodeExchanger>, session: Session) -> Self {
        Self {
            machine: FlowMachine::new(),
            store: EphemeralStateStore::new(),
            session,
            exchanger,
            linker: None,
        }
    }

    /// Attach a linker to run after each successful exchange
    #[must_use]
    pub fn with_linker(mut self, linker: Arc<dyn SubjectLinker>) -> Self {
        self.linker = Some(linker);
        self
    }

    /// Current session
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Whether per-attempt secrets are still stashed (an authorization was
    /// started and its callback has not consumed them)
    #[must_use]
    pub fn has_pending_attempt(&self) -> bool {
        !self.store.is_empty()
    }

    /// Seed the session from its durable store. Call once at startup, before
    /// any callback is handled.
    pub fn restore(&mut self) {
        self.session.restore();
        if self.session.status() == SessionStatus::Authenticated {
            // Seeded sessions skip the callback path; park the machine where
            // only Reset is accepted.
            let _ = self.machine.apply(FlowEvent::CallbackReceived);
            let _ = self.machine.apply(FlowEvent::ExchangeCompleted);
        }
    }

    /// Start a new authorization attempt: generate fresh PKCE material and a
    /// state token, stash both, and return the authorize URL to redirect to.
    ///
    /// Calling this from the error or authenticated state resets first, so a
    /// failed attempt can always be retried.
    ///
    /// # Errors
    ///
    /// Fails closed when the OS randomness source is unavailable, and fails
    /// when the configured authorize URL cannot be built.
    pub fn begin_authorization(&mut self) -> Result<String, AppError> {
        match self.machine.state() {
            FlowState::Authenticated | FlowState::Error => {
                self.machine
                    .apply(FlowEvent::Reset)
                    .map_err(|e| AppError::new(ErrorCode::FlowRejected, e.to_string()))?;
                self.session.logout();
            }
            FlowState::Loading => {
                return Err(AppError::new(
                    ErrorCode::FlowRejected,
                    "an authorization attempt is already in flight",
                ));
            }
            FlowState::Idle => {}
        }

        let pkce = PkceParams::generate()
            .map_err(|e| AppError::new(ErrorCode::InternalError, e.to_string()))?;
        let state = pkce::generate_state_token()
            .map_err(|e| AppError::new(ErrorCode::InternalError, e.to_string()))?;

        self.store
            .put(storage_keys::PKCE_VERIFIER, &pkce.code_verifier);
        self.store.put(storage_keys::OAUTH_STATE, &state);

        let url = self
            .exchanger
            .authorization_url(&state, &pkce)
            .map_err(|e| AppError::config(e.to_string()))?;

        info!("starting authorization attempt");
        Ok(url)
    }

    /// Handle the provider's redirect.
    ///
    /// The machine gates everything: a duplicate callback is reported as
    /// [`FlowOutcome::Replayed`] without touching the stored secrets or the
    /// session. Validation failures consume the secrets and land the session
    /// in the error state.
    pub async fn handle_callback(&mut self, params: &CallbackParams) -> FlowOutcome {
        if !params.is_callback() {
            return FlowOutcome::NoCallback;
        }

        if self.machine.apply(FlowEvent::CallbackReceived).is_err() {
            warn!("callback rejected: no attempt is accepting one");
            return FlowOutcome::Replayed;
        }
        self.session.begin_loading();

        if let Some(error) = &params.error {
            // Provider denied the attempt; the stored secrets are dead.
            self.store.clear();
            let message = match &params.error_description {
                Some(description) => format!("{error}: {description}"),
                None => error.clone(),
            };
            return self.fail(FlowEvent::ProviderError, message);
        }

        // One-shot reads; a replayed code can never find these again.
        let stored_state = self.store.take(storage_keys::OAUTH_STATE);
        let verifier = self.store.take(storage_keys::PKCE_VERIFIER);

        match (&stored_state, &params.state) {
            (Some(stored), Some(echoed)) if stored == echoed => {}
            _ => {
                AppLogger::log_security_event(
                    "state_mismatch",
                    "callback state token missing or does not match the stored value",
                    None,
                );
                self.store.clear();
                return self.fail(
                    FlowEvent::ExchangeFailed,
                    "state token mismatch; possible request forgery".to_owned(),
                );
            }
        }

        let Some(verifier) = verifier else {
            return self.fail(
                FlowEvent::ExchangeFailed,
                "no code verifier stored for this attempt".to_owned(),
            );
        };

        let Some(code) = &params.code else {
            return self.fail(
                FlowEvent::ExchangeFailed,
                "callback carried no authorization code".to_owned(),
            );
        };

        let tokens = match self.exchanger.exchange_code(code, &verifier).await {
            Ok(tokens) => tokens,
            Err(e) => return self.fail(FlowEvent::ExchangeFailed, e.to_string()),
        };

        self.session.login(tokens);
        if self.machine.apply(FlowEvent::ExchangeCompleted).is_err() {
            // Unreachable by construction: CallbackReceived put us in Loading.
            warn!("state machine out of step after exchange");
        }

        let (local_user_id, link_error) = self.link_after_login().await;
        if let Some(id) = local_user_id {
            self.session.set_local_user(id);
        }

        info!("authorization attempt completed");
        FlowOutcome::Authenticated {
            local_user_id,
            link_error,
        }
    }

    /// End the session and return to idle
    pub fn logout(&mut self) {
        self.store.clear();
        self.session.logout();
        let _ = self.machine.apply(FlowEvent::Reset);
    }

    fn fail(&mut self, event: FlowEvent, message: String) -> FlowOutcome {
        warn!(reason = %message, "authorization attempt failed");
        self.session.fail(message.clone());
        let _ = self.machine.apply(event);
        FlowOutcome::Failed { message }
    }

    /// Post-login identity linking. Failures degrade the outcome, never the
    /// login itself.
    async fn link_after_login(&self) -> (Option<Uuid>, Option<String>) {
        let Some(linker) = &self.linker else {
            return (None, None);
        };
        let Some(tokens) = self.session.tokens() else {
            return (None, None);
        };

        match linker.link_verified(&tokens.access_token).await {
            Ok(id) => (Some(id), None),
            Err(e) => {
                warn!(error = %e, "post-login identity linking failed");
                (None, Some(e.to_string()))
            }
        }
    }
}
