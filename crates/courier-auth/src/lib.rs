// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential cache for the Courier notification relay.
//!
//! Keeps an OAuth bearer token valid across many short-lived runs: the token
//! and its expiry are persisted, reused while fresh, and replaced through the
//! refresh-token grant only when absent or within the safety margin of
//! expiring. Grant rejections (`invalid_grant`) fail fast; transient failures
//! go through the shared [`RequestExecutor`](courier_resilience::RequestExecutor).

pub mod cache;
pub mod store;
pub mod token;

use std::sync::Arc;

use courier_config::model::OAuthConfig;
use courier_core::{AuthError, Clock};
use courier_resilience::RequestExecutor;

pub use cache::{CredentialCache, CredentialSettings};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::CachedToken;

/// Builds a credential cache from `[oauth]`, persisting to `cache_path` when
/// one is configured and keeping the token in memory otherwise.
pub fn credential_cache_from_config(
    config: &OAuthConfig,
    executor: RequestExecutor,
    clock: Arc<dyn Clock>,
) -> Result<CredentialCache, AuthError> {
    let settings = CredentialSettings::from_config(config)?;
    let store: Arc<dyn TokenStore> = match config.cache_path.as_deref() {
        Some(path) if !path.trim().is_empty() => Arc::new(FileTokenStore::new(path)),
        _ => Arc::new(MemoryTokenStore::new()),
    };
    Ok(CredentialCache::new(settings, executor, store, clock))
}
