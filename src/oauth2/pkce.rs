// ABOUTME: PKCE verifier and S256 challenge generation (RFC 7636)
// ABOUTME: Fails closed when no cryptographically secure random source is available
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

use crate::constants::oauth;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors raised during PKCE material generation
#[derive(Debug, Error)]
pub enum PkceError {
    /// Requested length outside the RFC 7636 bounds
    #[error("verifier length {0} outside allowed range 43-128")]
    InvalidLength(usize),
    /// The OS randomness source failed; the flow must not start
    #[error("secure random source unavailable: {0}")]
    RandomSourceUnavailable(String),
}

/// PKCE (Proof Key for Code Exchange) parameters for one authorization attempt
#[derive(Debug, Clone)]
pub struct PkceParams {
    /// Randomly generated code verifier (43-128 characters)
    pub code_verifier: String,
    /// SHA-256 hash of the code verifier, base64url encoded without padding
    pub code_challenge: String,
    /// Challenge method (always "S256")
    pub code_challenge_method: String,
}

impl PkceParams {
    /// Generate PKCE parameters with the S256 challenge method
    ///
    /// # Errors
    ///
    /// Returns an error when the OS randomness source is unavailable. There
    /// is deliberately no fallback to a non-cryptographic generator: the
    /// verifier's unguessability is the entire security of a public-client
    /// flow, so the attempt refuses to start instead.
    pub fn generate() -> Result<Self, PkceError> {
        let code_verifier = generate_random_string(oauth::VERIFIER_DEFAULT_LENGTH)?;
        let code_challenge = generate_challenge(&code_verifier);

        Ok(Self {
            code_verifier,
            code_challenge,
            code_challenge_method: oauth::CHALLENGE_METHOD_S256.into(),
        })
    }
}

/// Generate a random string of `length` characters drawn uniformly from the
/// RFC 7636 unreserved set `[A-Za-z0-9\-._~]`
///
/// # Errors
///
/// Returns [`PkceError::InvalidLength`] when `length` is outside 43-128 and
/// [`PkceError::RandomSourceUnavailable`] when the OS generator fails.
pub fn generate_random_string(length: usize) -> Result<String, PkceError> {
    if !(oauth::VERIFIER_MIN_LENGTH..=oauth::VERIFIER_MAX_LENGTH).contains(&length) {
        return Err(PkceError::InvalidLength(length));
    }
    random_from_charset(length)
}

/// Generate an anti-CSRF state token from the same unreserved alphabet.
/// Not a PKCE verifier, so the RFC 7636 length bounds do not apply.
///
/// # Errors
///
/// Returns [`PkceError::RandomSourceUnavailable`] when the OS generator
/// fails; the attempt must not start with a guessable token.
pub fn generate_state_token() -> Result<String, PkceError> {
    random_from_charset(oauth::STATE_TOKEN_LENGTH)
}

fn random_from_charset(length: usize) -> Result<String, PkceError> {
    let charset_len = oauth::VERIFIER_CHARSET.len();
    // Rejection sampling keeps the distribution uniform: accept only bytes
    // below the largest multiple of the charset size.
    let accept_below = u8::MAX - (u8::MAX % charset_len as u8);

    let mut out = String::with_capacity(length);
    let mut buf = [0_u8; 64];

    while out.len() < length {
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| PkceError::RandomSourceUnavailable(e.to_string()))?;

        for byte in buf {
            if byte < accept_below {
                out.push(oauth::VERIFIER_CHARSET[(byte as usize) % charset_len] as char);
                if out.len() == length {
                    break;
                }
            }
        }
    }

    Ok(out)
}

/// Compute the S256 challenge for a verifier: base64url(SHA-256(verifier)),
/// trailing padding stripped. Deterministic function of the verifier.
#[must_use]
pub fn generate_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
