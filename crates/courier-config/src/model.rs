// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier notification relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level Courier configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section except `[[sources]]` has defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Process-level settings (logging, run timeout).
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Retry policy shared by every outbound HTTP call.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Delivery channel defaults.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Refresh-token grant settings for the credential cache.
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// Where dedup record documents live.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Configured sources, in dispatch order.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl CourierConfig {
    /// Looks up a source by its short code.
    pub fn source_by_code(&self, code: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.short_code == code)
    }
}

/// Process-level settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound for one whole run, after which remaining work is cancelled.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

impl RuntimeConfig {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_run_timeout_secs() -> u64 {
    900
}

/// Delay growth between retry attempts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BackoffKind {
    /// The same delay before every retry.
    #[default]
    Fixed,
    /// The delay doubles after each attempt, capped at `max_delay_secs`.
    Exponential,
}

/// Retry policy for outbound HTTP calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,

    #[serde(default)]
    pub backoff: BackoffKind,

    /// Cap for exponential delays and server-provided retry hints.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,

    /// Timeout applied to each attempt independently.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_delay_secs(),
            backoff: BackoffKind::default(),
            max_delay_secs: default_max_delay_secs(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_secs() -> f64 {
    5.0
}

fn default_max_delay_secs() -> f64 {
    60.0
}

fn default_attempt_timeout_secs() -> f64 {
    15.0
}

/// Delivery channel defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Sender label used when a source does not set `username`.
    #[serde(default = "default_username")]
    pub default_username: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            default_username: default_username(),
        }
    }
}

fn default_username() -> String {
    "Courier".to_string()
}

/// Refresh-token grant configuration.
///
/// Secrets are usually supplied through `COURIER_OAUTH_CLIENT_SECRET` and
/// `COURIER_OAUTH_REFRESH_TOKEN` rather than the TOML file.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OAuthConfig {
    /// Token endpoint receiving the form-encoded grant.
    #[serde(default)]
    pub token_url: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Optional space-separated scope list sent with the grant.
    #[serde(default)]
    pub scope: Option<String>,

    /// File where the access token (and rotated refresh token) are cached
    /// between runs. `None` keeps the token in memory only.
    #[serde(default = "default_token_cache_path")]
    pub cache_path: Option<String>,

    /// Tokens expiring within this many seconds are treated as expired.
    #[serde(default = "default_margin_secs")]
    pub margin_secs: u64,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            token_url: None,
            client_id: None,
            client_secret: None,
            refresh_token: None,
            scope: None,
            cache_path: default_token_cache_path(),
            margin_secs: default_margin_secs(),
        }
    }
}

impl OAuthConfig {
    /// Returns true when any grant field has been set.
    pub fn is_configured(&self) -> bool {
        self.token_url.is_some()
            || self.client_id.is_some()
            || self.client_secret.is_some()
            || self.refresh_token.is_some()
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("scope", &self.scope)
            .field("cache_path", &self.cache_path)
            .field("margin_secs", &self.margin_secs)
            .finish()
    }
}

fn default_token_cache_path() -> Option<String> {
    dirs::cache_dir().map(|d| d.join("courier/token.json").display().to_string())
}

fn default_margin_secs() -> u64 {
    120
}

/// Record store backend selector.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StorageBackendKind {
    /// JSON documents in a local directory.
    #[default]
    Local,
    /// JSON documents behind an authenticated HTTP document API.
    Remote,
}

/// Record store location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,

    /// Directory holding record documents (local backend).
    #[serde(default = "default_storage_directory")]
    pub directory: String,

    /// URL template for remote documents; `{document}` is replaced with the
    /// document name (remote backend).
    #[serde(default)]
    pub url_template: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            directory: default_storage_directory(),
            url_template: None,
        }
    }
}

fn default_storage_directory() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("courier").display().to_string())
        .unwrap_or_else(|| "./state".to_string())
}

/// Built-in collector kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CollectorKind {
    /// A JSON Feed 1.1 document fetched over HTTP.
    #[default]
    JsonFeed,
    /// An RSS 2.0, RSS 1.0 or Atom feed fetched over HTTP.
    Rss,
}

/// Built-in transformer kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransformKind {
    /// One rich embed per item.
    #[default]
    Embed,
    /// Plain text, chunked to the endpoint's message size limit.
    Text,
}

/// How new items are grouped before transform and delivery.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BatchMode {
    /// Every new item is its own batch: delivered and committed on its own.
    #[default]
    PerItem,
    /// All new items form a single batch (e.g. one digest).
    Combined,
}

/// One configured source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Unique source name.
    pub name: String,

    /// Code used to select this source on the command line.
    pub short_code: String,

    #[serde(default)]
    pub kind: CollectorKind,

    /// Collector input URL (feed location).
    #[serde(default)]
    pub url: Option<String>,

    /// Delivery endpoint for this source.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Sender label; falls back to `delivery.default_username`.
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub transform: TransformKind,

    #[serde(default)]
    pub batch: BatchMode,

    /// Records older than this are pruned from the source's document.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Items published longer ago than this are skipped.
    #[serde(default)]
    pub max_item_age_days: Option<u32>,

    /// Record document name; defaults to `<name>_record.json`.
    #[serde(default)]
    pub document: Option<String>,

    /// Embed accent colour.
    #[serde(default)]
    pub color: Option<u32>,
}

impl SourceConfig {
    /// Returns the record document name for this source.
    pub fn document_name(&self) -> String {
        self.document
            .clone()
            .unwrap_or_else(|| format!("{}_record.json", self.name.replace(['-', ' '], "_")))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.retention_days) * 24 * 60 * 60)
    }

    pub fn max_item_age(&self) -> Option<Duration> {
        self.max_item_age_days
            .map(|days| Duration::from_secs(u64::from(days) * 24 * 60 * 60))
    }
}

fn default_retention_days() -> u32 {
    7
}
