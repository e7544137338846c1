// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./courier.toml` > `~/.config/courier/courier.toml` > `/etc/courier/courier.toml`
//! with environment variable overrides via the `COURIER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CourierConfig;

/// Config file name looked up in each hierarchy level.
pub const CONFIG_FILE_NAME: &str = "courier.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/courier/courier.toml` (system-wide)
/// 3. `~/.config/courier/courier.toml` (user XDG config)
/// 4. `./courier.toml` (local directory)
/// 5. `explicit` file, when given on the command line
/// 6. `COURIER_*` environment variables
pub fn load_config(explicit: Option<&Path>) -> Result<CourierConfig, figment::Error> {
    build_figment(explicit).extract()
}

/// Load configuration from a TOML string only (no files, no environment).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment(explicit: Option<&Path>) -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::file(system_config_path()))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(CONFIG_FILE_NAME));

    if let Some(path) = explicit {
        tracing::debug!(path = %path.display(), "merging explicit config file");
        figment = figment.merge(Toml::file(path));
    }

    figment.merge(env_provider())
}

pub(crate) fn system_config_path() -> std::path::PathBuf {
    Path::new("/etc/courier").join(CONFIG_FILE_NAME)
}

pub(crate) fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("courier").join(CONFIG_FILE_NAME))
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: key names contain
/// underscores, so `COURIER_OAUTH_CLIENT_SECRET` must map to
/// `oauth.client_secret`, not `oauth.client.secret`.
fn env_provider() -> Env {
    Env::prefixed("COURIER_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("runtime_", "runtime.", 1)
            .replacen("retry_", "retry.", 1)
            .replacen("delivery_", "delivery.", 1)
            .replacen("oauth_", "oauth.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}
