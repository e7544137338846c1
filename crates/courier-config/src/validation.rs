// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express:
//! unique source codes, reachable endpoints, and the credentials the chosen
//! storage backend needs. A missing required value is a startup error, never
//! something discovered halfway through a run.

use std::collections::{HashMap, HashSet};

use crate::diagnostic::ConfigError;
use crate::model::{CourierConfig, StorageBackendKind};

/// Short code reserved for "run every source".
pub const ALL_SOURCES_CODE: &str = "all";

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// every collected validation error (does not fail fast).
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    validate_retry(config, &mut errors);
    validate_storage(config, &mut errors);
    validate_sources(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn push(errors: &mut Vec<ConfigError>, message: String) {
    errors.push(ConfigError::Validation { message });
}

fn validate_retry(config: &CourierConfig, errors: &mut Vec<ConfigError>) {
    let retry = &config.retry;

    if retry.max_attempts < 1 {
        push(errors, "retry.max_attempts must be at least 1".to_string());
    }
    if !(retry.delay_secs >= 0.0 && retry.delay_secs.is_finite()) {
        push(
            errors,
            format!("retry.delay_secs must be non-negative, got {}", retry.delay_secs),
        );
    }
    if !(retry.max_delay_secs >= retry.delay_secs && retry.max_delay_secs.is_finite()) {
        push(
            errors,
            format!(
                "retry.max_delay_secs ({}) must be at least retry.delay_secs ({})",
                retry.max_delay_secs, retry.delay_secs
            ),
        );
    }
    if !(retry.attempt_timeout_secs > 0.0 && retry.attempt_timeout_secs.is_finite()) {
        push(
            errors,
            format!(
                "retry.attempt_timeout_secs must be positive, got {}",
                retry.attempt_timeout_secs
            ),
        );
    }
    if config.runtime.run_timeout_secs == 0 {
        push(errors, "runtime.run_timeout_secs must be positive".to_string());
    }
}

fn validate_storage(config: &CourierConfig, errors: &mut Vec<ConfigError>) {
    match config.storage.backend {
        StorageBackendKind::Local => {
            if config.storage.directory.trim().is_empty() {
                push(errors, "storage.directory must not be empty".to_string());
            }
        }
        StorageBackendKind::Remote => {
            match config.storage.url_template.as_deref() {
                None => errors.push(ConfigError::MissingKey {
                    key: "storage.url_template".to_string(),
                }),
                Some(template) => {
                    if !template.contains("{document}") {
                        push(
                            errors,
                            "storage.url_template must contain the `{document}` placeholder"
                                .to_string(),
                        );
                    }
                    if !is_http_url(template) {
                        push(
                            errors,
                            format!("storage.url_template `{template}` is not an http(s) URL"),
                        );
                    }
                }
            }
        }
    }

    if config.storage.backend == StorageBackendKind::Remote || config.oauth.is_configured() {
        validate_oauth_complete(config, errors);
    }
}

fn validate_oauth_complete(config: &CourierConfig, errors: &mut Vec<ConfigError>) {
    let oauth = &config.oauth;
    let required = [
        ("oauth.token_url", &oauth.token_url),
        ("oauth.client_id", &oauth.client_id),
        ("oauth.client_secret", &oauth.client_secret),
        ("oauth.refresh_token", &oauth.refresh_token),
    ];

    for (key, value) in required {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            errors.push(ConfigError::MissingKey {
                key: key.to_string(),
            });
        }
    }

    if let Some(url) = oauth.token_url.as_deref()
        && !url.trim().is_empty()
        && !is_http_url(url)
    {
        push(errors, format!("oauth.token_url `{url}` is not an http(s) URL"));
    }
}

fn validate_sources(config: &CourierConfig, errors: &mut Vec<ConfigError>) {
    let mut seen_names = HashSet::new();
    let mut seen_codes = HashSet::new();
    let mut documents: HashMap<String, &str> = HashMap::new();

    for (i, source) in config.sources.iter().enumerate() {
        if source.name.trim().is_empty() {
            push(errors, format!("sources[{i}].name must not be empty"));
        } else if !seen_names.insert(source.name.as_str()) {
            push(
                errors,
                format!("duplicate source name `{}` in [[sources]] array", source.name),
            );
        }

        let code = source.short_code.trim();
        if code.is_empty() {
            push(errors, format!("sources[{i}].short_code must not be empty"));
        } else if code == ALL_SOURCES_CODE {
            push(
                errors,
                format!("sources[{i}].short_code `{ALL_SOURCES_CODE}` is reserved"),
            );
        } else if !seen_codes.insert(code) {
            push(
                errors,
                format!("duplicate short_code `{code}` in [[sources]] array"),
            );
        }

        // Two sources writing one document would overwrite each other's records.
        let document = source.document_name();
        if let Some(owner) = documents.get(&document) {
            push(
                errors,
                format!(
                    "sources `{owner}` and `{}` both use record document `{document}`",
                    source.name
                ),
            );
        } else {
            documents.insert(document, source.name.as_str());
        }

        match source.webhook_url.as_deref() {
            None => errors.push(ConfigError::MissingKey {
                key: format!("sources[{i}].webhook_url"),
            }),
            Some(url) if !is_http_url(url) => push(
                errors,
                format!("sources[{i}].webhook_url is not an http(s) URL"),
            ),
            Some(_) => {}
        }

        match source.url.as_deref() {
            None => errors.push(ConfigError::MissingKey {
                key: format!("sources[{i}].url"),
            }),
            Some(url) if !is_http_url(url) => push(
                errors,
                format!("sources[{i}].url `{url}` is not an http(s) URL"),
            ),
            Some(_) => {}
        }

        if source.retention_days < 1 {
            push(
                errors,
                format!("sources[{i}].retention_days must be at least 1"),
            );
        }

        if let Some(age) = source.max_item_age_days
            && age < 1
        {
            push(
                errors,
                format!("sources[{i}].max_item_age_days must be at least 1"),
            );
        }
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("https://") || value.starts_with("http://")
}
