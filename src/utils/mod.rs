// ABOUTME: Shared utility modules
// ABOUTME: HTTP client pooling and other cross-cutting helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

/// Shared HTTP client utilities
pub mod http_client;
