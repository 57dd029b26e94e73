// ABOUTME: Supabase admin-API backend for the user-record store
// ABOUTME: Talks to /auth/v1/admin/users with a service-role key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

use super::{UserRecord, UserStore, UserStoreError};
use crate::config::UserStoreConfig;
use crate::utils::http_client::shared_client;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Metadata key tagging a record with its external subject identifier
const EXTERNAL_ID_KEY: &str = "hanko_user_id";

/// User-record store backed by the Supabase admin user API
pub struct SupabaseAdminStore {
    config: UserStoreConfig,
    client: reqwest::Client,
}

/// Wire shape of an admin-API user object (fields the bridge reads)
#[derive(Debug, Deserialize)]
struct AdminUser {
    id: Uuid,
    email: Option<String>,
    email_confirmed_at: Option<String>,
    user_metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Wire shape of the admin-API list response
#[derive(Debug, Deserialize)]
struct AdminUserList {
    users: Vec<AdminUser>,
}

impl AdminUser {
    fn into_record(self) -> UserRecord {
        let external_id = self
            .user_metadata
            .as_ref()
            .and_then(|m| m.get(EXTERNAL_ID_KEY))
            .and_then(|v| v.as_str())
            .map(str::to_owned);

        UserRecord {
            id: self.id,
            email: self.email.unwrap_or_default(),
            external_id,
            email_verified: self.email_confirmed_at.is_some(),
        }
    }
}

impl SupabaseAdminStore {
    /// Create a store over the configured Supabase project
    #[must_use]
    pub fn new(config: UserStoreConfig) -> Self {
        Self {
            config,
            client: shared_client().clone(),
        }
    }

    /// Create a store with a caller-supplied HTTP client
    #[must_use]
    pub fn with_http_client(config: UserStoreConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn admin_users_url(&self) -> String {
        format!("{}/auth/v1/admin/users", self.config.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
    }
}

#[async_trait]
impl UserStore for SupabaseAdminStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UserStoreError> {
        let response = self
            .authed(self.client.get(self.admin_users_url()))
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| UserStoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UserStoreError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let list: AdminUserList = response
            .json()
            .await
            .map_err(|e| UserStoreError::Malformed(e.to_string()))?;

        // The admin API filter is a prefix match on some deployments, so
        // insist on an exact (case-insensitive) email before trusting it.
        let wanted = email.to_lowercase();
        Ok(list
            .users
            .into_iter()
            .find(|u| {
                u.email
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase() == wanted)
            })
            .map(AdminUser::into_record))
    }

    async fn create_verified(
        &self,
        email: &str,
        external_id: &str,
    ) -> Result<UserRecord, UserStoreError> {
        let body = json!({
            "email": email,
            "email_confirm": true,
            "user_metadata": { EXTERNAL_ID_KEY: external_id },
        });

        let response = self
            .authed(self.client.post(self.admin_users_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| UserStoreError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
            || status == reqwest::StatusCode::CONFLICT
        {
            return Err(UserStoreError::Duplicate(email.to_owned()));
        }
        if !status.is_success() {
            return Err(UserStoreError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let user: AdminUser = response
            .json()
            .await
            .map_err(|e| UserStoreError::Malformed(e.to_string()))?;

        Ok(user.into_record())
    }

    async fn set_external_id(&self, id: Uuid, external_id: &str) -> Result<(), UserStoreError> {
        let body = json!({
            "user_metadata": { EXTERNAL_ID_KEY: external_id },
        });

        let response = self
            .authed(
                self.client
                    .put(format!("{}/{id}", self.admin_users_url())),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| UserStoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UserStoreError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}
