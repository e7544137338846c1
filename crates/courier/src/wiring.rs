// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the run's shared components from configuration and runs the
//! selected sources.

use std::sync::Arc;

use courier_auth::credential_cache_from_config;
use courier_config::model::{OAuthConfig, SourceConfig, StorageConfig};
use courier_config::{ALL_SOURCES_CODE, CourierConfig};
use courier_core::{Clock, CourierError, SystemClock};
use courier_discord::WebhookChannel;
use courier_pipeline::{Orchestrator, RunReport, Source};
use courier_resilience::{RequestExecutor, RetryPolicy, client_builder};
use courier_storage::backend_from_config;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Resolves a command-line selection into the sources to run.
///
/// `all` selects every configured source; anything else must be a short code.
pub fn select_sources<'a>(config: &'a CourierConfig, code: &str) -> Option<Vec<&'a SourceConfig>> {
    if code == ALL_SOURCES_CODE {
        return Some(config.sources.iter().collect());
    }
    config.source_by_code(code).map(|source| vec![source])
}

/// Closest configured short code to a mistyped one.
pub fn suggest_code<'a>(config: &'a CourierConfig, code: &str) -> Option<&'a str> {
    config
        .sources
        .iter()
        .map(|s| (s.short_code.as_str(), strsim::jaro_winkler(code, &s.short_code)))
        .filter(|(_, score)| *score >= 0.75)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(code, _)| code)
}

/// Expands a leading `~/` to the home directory.
fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).display().to_string(),
        _ => path.to_string(),
    }
}

fn http_client(policy: &RetryPolicy) -> Result<reqwest::Client, CourierError> {
    client_builder(policy)
        .user_agent(concat!("courier/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CourierError::Internal(format!("failed to build HTTP client: {e}")))
}

/// Runs `selected` sources with components built from `config`.
pub async fn run_sources(
    config: &CourierConfig,
    selected: &[&SourceConfig],
    cancel: &CancellationToken,
) -> Result<RunReport, CourierError> {
    let policy = RetryPolicy::from_config(&config.retry);
    let executor = RequestExecutor::new(http_client(&policy)?, policy);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let credentials = if config.oauth.is_configured() {
        let oauth = OAuthConfig {
            cache_path: config.oauth.cache_path.as_deref().map(expand_home),
            ..config.oauth.clone()
        };
        let cache = credential_cache_from_config(&oauth, executor.clone(), clock.clone())?;
        Some(Arc::new(cache))
    } else {
        None
    };

    let storage = StorageConfig {
        directory: expand_home(&config.storage.directory),
        ..config.storage.clone()
    };
    let backend = backend_from_config(&storage, executor.clone(), credentials)?;
    debug!(backend = %backend.describe(), "record backend ready");

    let sources = selected
        .iter()
        .map(|source| Source::from_config(source, &config.delivery, executor.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    let channel = Arc::new(WebhookChannel::new(executor));
    let orchestrator =
        Orchestrator::new(channel, backend, clock).with_run_timeout(config.runtime.run_timeout());

    info!(sources = sources.len(), "starting run");
    Ok(orchestrator.run(&sources, cancel).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CourierConfig {
        courier_config::load_and_validate_str(
            r#"
[[sources]]
name = "campus-news"
short_code = "news"
url = "https://example.com/feed.json"
webhook_url = "https://hooks.example/1/token"

[[sources]]
name = "events"
short_code = "events"
url = "https://example.com/events.json"
webhook_url = "https://hooks.example/2/token"
"#,
        )
        .unwrap()
    }

    #[test]
    fn all_selects_every_source() {
        let config = config();
        assert_eq!(select_sources(&config, "all").unwrap().len(), 2);
    }

    #[test]
    fn short_code_selects_one_source() {
        let config = config();
        let selected = select_sources(&config, "events").unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "events");
    }

    #[test]
    fn unknown_code_selects_nothing_and_gets_a_suggestion() {
        let config = config();
        assert!(select_sources(&config, "nwes").is_none());
        assert_eq!(suggest_code(&config, "nwes"), Some("news"));
        assert_eq!(suggest_code(&config, "zzzzzz"), None);
    }

    #[test]
    fn home_prefix_is_expanded() {
        assert_eq!(expand_home("/var/lib/courier"), "/var/lib/courier");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_home("~/state"),
                home.join("state").display().to_string()
            );
        }
    }
}
