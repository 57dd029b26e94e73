// ABOUTME: Shared server resources threaded through all route handlers
// ABOUTME: Builds the upstream clients once and hands out Arc references

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

use crate::config::ServerConfig;
use crate::linking::IdentityLinkService;
use crate::oauth2::AuthServerClient;
use crate::users::supabase::SupabaseAdminStore;
use crate::users::UserStore;
use std::sync::Arc;

/// Long-lived resources shared by every request
pub struct ServerResources {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
    /// Authorization-server client (token exchange, introspection)
    pub auth_client: Arc<AuthServerClient>,
    /// Identity linker over the user-record store
    pub linker: Arc<IdentityLinkService>,
}

impl ServerResources {
    /// Build the resource set from configuration, wiring the Supabase-backed
    /// user store into the linker
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let auth_client = Arc::new(AuthServerClient::new(config.auth.clone()));
        let users: Arc<dyn UserStore> =
            Arc::new(SupabaseAdminStore::new(config.user_store.clone()));
        let linker = Arc::new(IdentityLinkService::new(Arc::clone(&auth_client), users));

        Self {
            config: Arc::new(config),
            auth_client,
            linker,
        }
    }

    /// Build resources with a caller-supplied user store (tests, demos)
    #[must_use]
    pub fn with_user_store(config: ServerConfig, users: Arc<dyn UserStore>) -> Self {
        let auth_client = Arc::new(AuthServerClient::new(config.auth.clone()));
        let linker = Arc::new(IdentityLinkService::new(Arc::clone(&auth_client), users));

        Self {
            config: Arc::new(config),
            auth_client,
            linker,
        }
    }
}
