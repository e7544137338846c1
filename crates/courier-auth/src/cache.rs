// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The credential cache: returns a valid bearer token, refreshing it through
//! the refresh-token grant only when the cached one is absent or stale.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use courier_config::model::OAuthConfig;
use courier_core::{AuthError, Clock};
use courier_resilience::{RequestError, RequestExecutor};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::store::TokenStore;
use crate::token::CachedToken;

/// Static inputs of the refresh-token grant.
#[derive(Debug, Clone)]
pub struct CredentialSettings {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
    pub scope: Option<String>,
    /// Tokens expiring within this window are treated as expired.
    pub margin: Duration,
}

impl CredentialSettings {
    /// Extracts grant settings from `[oauth]`, reporting the first missing field.
    pub fn from_config(config: &OAuthConfig) -> Result<Self, AuthError> {
        fn required(value: &Option<String>, field: &str) -> Result<String, AuthError> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| AuthError::Missing {
                    field: field.to_string(),
                })
        }

        Ok(Self {
            token_url: required(&config.token_url, "oauth.token_url")?,
            client_id: required(&config.client_id, "oauth.client_id")?,
            client_secret: SecretString::from(required(
                &config.client_secret,
                "oauth.client_secret",
            )?),
            refresh_token: SecretString::from(required(
                &config.refresh_token,
                "oauth.refresh_token",
            )?),
            scope: config.scope.clone(),
            margin: Duration::from_secs(config.margin_secs),
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: ExpiresIn,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Some endpoints send `expires_in` as a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(u64),
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> Option<u64> {
        match self {
            ExpiresIn::Seconds(s) => Some(*s),
            ExpiresIn::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Default)]
struct CacheState {
    token: Option<CachedToken>,
    loaded: bool,
}

/// Keeps one bearer token valid across calls and process runs.
///
/// The state lock is held for the whole refresh, so concurrent callers that
/// find the token stale wait for a single grant exchange and reuse its result.
pub struct CredentialCache {
    settings: CredentialSettings,
    executor: RequestExecutor,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState>,
}

impl CredentialCache {
    pub fn new(
        settings: CredentialSettings,
        executor: RequestExecutor,
        store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            executor,
            store,
            clock,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns a bearer token that stays valid for at least the margin.
    pub async fn get_token(&self) -> Result<SecretString, AuthError> {
        let mut state = self.state.lock().await;

        if !state.loaded {
            state.token = match self.store.load().await {
                Ok(token) => token,
                Err(e) => {
                    warn!(error = %e, "token cache unreadable, refreshing");
                    None
                }
            };
            state.loaded = true;
        }

        let now = self.clock.now();
        if let Some(token) = state.token.as_ref() {
            if token.is_fresh(now, self.settings.margin) {
                debug!(expires_at = %token.expires_at, "using cached access token");
                return Ok(token.access_token.clone());
            }
            debug!(expires_at = %token.expires_at, "cached access token is stale");
        }

        let rotated = state.token.as_ref().and_then(|t| t.refresh_token.clone());
        let refresh_token = rotated
            .clone()
            .unwrap_or_else(|| self.settings.refresh_token.clone());

        let mut fresh = self.refresh(&refresh_token).await?;
        // A response without a new refresh token leaves the rotated one in force.
        if fresh.refresh_token.is_none() {
            fresh.refresh_token = rotated;
        }
        let access_token = fresh.access_token.clone();
        let persisted = self.store.save(&fresh).await;
        state.token = Some(fresh);
        persisted?;

        Ok(access_token)
    }

    /// Drops the in-memory token so the next [`get_token`](Self::get_token)
    /// refreshes, e.g. after the token was refused with 401.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        if let Some(token) = state.token.as_mut() {
            token.expires_at = self.clock.now() - TimeDelta::seconds(1);
        }
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<CachedToken, AuthError> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.expose_secret()),
            ("refresh_token", refresh_token.expose_secret()),
        ];
        if let Some(scope) = self.settings.scope.as_deref() {
            form.push(("scope", scope));
        }

        let request = self
            .executor
            .client()
            .post(&self.settings.token_url)
            .form(&form)
            .build()
            .map_err(|e| AuthError::Unavailable {
                message: format!("building token request: {e}"),
            })?;

        let requested_at = self.clock.now();
        let response = self.executor.execute(request).await.map_err(map_request_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| AuthError::Unavailable {
            message: format!("reading token response: {e}"),
        })?;

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::Rejected {
                status,
                code: "invalid_response".to_string(),
                description: Some(e.to_string()),
            })?;
        let expires_in = parsed.expires_in.seconds().ok_or_else(|| AuthError::Rejected {
            status,
            code: "invalid_response".to_string(),
            description: Some("expires_in is not a number of seconds".to_string()),
        })?;

        let expires_at =
            requested_at + TimeDelta::seconds(expires_in.min(u64::from(u32::MAX)) as i64);
        let rotated = parsed.refresh_token.is_some();
        info!(%expires_at, rotated, "access token refreshed");

        Ok(CachedToken {
            access_token: SecretString::from(parsed.access_token),
            expires_at,
            refresh_token: parsed.refresh_token.map(SecretString::from),
        })
    }
}

fn map_request_error(err: RequestError) -> AuthError {
    match err {
        RequestError::Rejected { status, body, .. } => {
            let (code, description) = match serde_json::from_str::<OAuthErrorBody>(&body) {
                Ok(parsed) => (parsed.error, parsed.error_description),
                Err(_) => (format!("http_{}", status.as_u16()), Some(body)),
            };
            AuthError::Rejected {
                status: status.as_u16(),
                code,
                description,
            }
        }
        RequestError::Exhausted { attempts, last } => AuthError::Unavailable {
            message: format!("{attempts} attempt(s): {last}"),
        },
        RequestError::Build(e) => AuthError::Unavailable {
            message: e.to_string(),
        },
    }
}
