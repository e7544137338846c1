// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Courier notification relay.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `COURIER_*` environment variable overrides, and
//! miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use courier_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("{} source(s) configured", config.sources.len());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::CourierConfig;
pub use validation::ALL_SOURCES_CODE;

/// Load configuration from the XDG hierarchy (plus an optional explicit file)
/// and validate it.
///
/// On a Figment error the TOML sources are re-read so diagnostics can point
/// at the offending key.
pub fn load_and_validate(explicit: Option<&Path>) -> Result<CourierConfig, Vec<ConfigError>> {
    match loader::load_config(explicit) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let toml_sources = collect_toml_sources(explicit);
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from a specific TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<CourierConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Renders the effective configuration as TOML with secrets masked.
pub fn effective_toml(config: &CourierConfig) -> Result<String, ConfigError> {
    let mut masked = config.clone();
    for secret in [
        &mut masked.oauth.client_secret,
        &mut masked.oauth.refresh_token,
    ] {
        if secret.is_some() {
            *secret = Some("[REDACTED]".to_string());
        }
    }
    for source in &mut masked.sources {
        if source.webhook_url.is_some() {
            source.webhook_url = Some("[REDACTED]".to_string());
        }
    }
    toml::to_string_pretty(&masked).map_err(|e| ConfigError::Other(e.to_string()))
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources(explicit: Option<&Path>) -> Vec<(String, String)> {
    let mut sources = Vec::new();

    let mut candidates = vec![loader::system_config_path()];
    if let Some(user) = loader::user_config_path() {
        candidates.push(user);
    }
    candidates.push(
        std::env::current_dir()
            .map(|d| d.join(loader::CONFIG_FILE_NAME))
            .unwrap_or_else(|_| loader::CONFIG_FILE_NAME.into()),
    );
    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }

    for path in candidates {
        if let Ok(content) = std::fs::read_to_string(&path) {
            sources.push((path.display().to_string(), content));
        }
    }

    sources
}
