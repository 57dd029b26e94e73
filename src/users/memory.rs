// ABOUTME: In-memory user-record store backend
// ABOUTME: Backs linker tests and local demos; counts mutations for spy assertions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

use super::{UserRecord, UserStore, UserStoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

/// In-memory [`UserStore`] backend
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<Uuid, UserRecord>,
    creates: AtomicUsize,
    updates: AtomicUsize,
    /// When set, `create_verified` reports a duplicate instead of inserting,
    /// simulating a store whose create/list views disagree
    fail_create_as_duplicate: AtomicBool,
    /// When set together with the flag above, the record is inserted anyway
    /// before the duplicate is reported, as if a concurrent writer won the
    /// race and its record is now visible
    duplicate_becomes_visible: AtomicBool,
}

impl MemoryUserStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly
    pub fn insert(&self, record: UserRecord) {
        self.users.insert(record.id, record);
    }

    /// Number of `create_verified` calls observed
    #[must_use]
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of `set_external_id` calls observed
    #[must_use]
    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Total records held
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the store holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Make `create_verified` report a duplicate without inserting
    pub fn fail_create_as_duplicate(&self, enabled: bool) {
        self.fail_create_as_duplicate
            .store(enabled, Ordering::SeqCst);
    }

    /// Make the simulated duplicate leave a visible record behind
    pub fn duplicate_becomes_visible(&self, enabled: bool) {
        self.duplicate_becomes_visible
            .store(enabled, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UserStoreError> {
        let wanted = email.to_lowercase();
        Ok(self
            .users
            .iter()
            .find(|entry| entry.email.to_lowercase() == wanted)
            .map(|entry| entry.value().clone()))
    }

    async fn create_verified(
        &self,
        email: &str,
        external_id: &str,
    ) -> Result<UserRecord, UserStoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);

        if self.fail_create_as_duplicate.load(Ordering::SeqCst) {
            if self.duplicate_becomes_visible.load(Ordering::SeqCst) {
                let record = UserRecord {
                    id: Uuid::new_v4(),
                    email: email.to_owned(),
                    external_id: None,
                    email_verified: true,
                };
                self.users.insert(record.id, record);
            }
            return Err(UserStoreError::Duplicate(email.to_owned()));
        }

        if self.find_by_email(email).await?.is_some() {
            return Err(UserStoreError::Duplicate(email.to_owned()));
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            external_id: Some(external_id.to_owned()),
            email_verified: true,
        };
        self.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn set_external_id(&self, id: Uuid, external_id: &str) -> Result<(), UserStoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);

        match self.users.get_mut(&id) {
            Some(mut record) => {
                record.external_id = Some(external_id.to_owned());
                Ok(())
            }
            None => Err(UserStoreError::Api {
                status: 404,
                message: format!("no user {id}"),
            }),
        }
    }
}
