// ABOUTME: Ephemeral single-use storage for per-attempt PKCE verifier and CSRF state
// ABOUTME: Values are removed on read; nothing survives consumption
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

use dashmap::DashMap;

/// Ephemeral, single-use key/value store scoped to one flow instance.
///
/// Holds exactly two logical entries per authorization attempt (the PKCE
/// verifier and the anti-CSRF state token). `take` removes on read so a
/// value can never be consumed twice.
#[derive(Default)]
pub struct EphemeralStateStore {
    entries: DashMap<String, String>,
}

impl EphemeralStateStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under a logical key, replacing any previous value
    pub fn put(&self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_owned(), value.into());
    }

    /// Remove and return the value under `key`. One-shot: a second call
    /// for the same key returns `None`.
    #[must_use]
    pub fn take(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Whether the store holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
