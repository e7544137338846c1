// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry policy: attempt budget, backoff shape and per-attempt timeout.

use std::time::Duration;

use courier_config::model::{BackoffKind, RetryConfig};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

/// Header carrying the endpoint's own "retry after N seconds" hint (float).
pub const RESET_AFTER_HEADER: &str = "x-ratelimit-reset-after";

/// How many times to try a request and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Never below 1.
    pub max_attempts: u32,
    /// Base delay between attempts.
    pub delay: Duration,
    pub backoff: BackoffKind,
    /// Upper bound for computed delays and server hints.
    pub max_delay: Duration,
    /// Bound for each individual attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Builds a policy from the `[retry]` configuration section.
    pub fn from_config(config: &RetryConfig) -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: secs(config.delay_secs, defaults.delay_secs),
            backoff: config.backoff,
            max_delay: secs(config.max_delay_secs, defaults.max_delay_secs),
            attempt_timeout: secs(config.attempt_timeout_secs, defaults.attempt_timeout_secs),
        }
    }

    /// A fixed-delay policy, mostly for tests and one-off callers.
    pub fn fixed(max_attempts: u32, delay: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff: BackoffKind::Fixed,
            max_delay: delay.max(Duration::from_secs(60)),
            attempt_timeout,
        }
    }

    /// Delay before the attempt following `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            BackoffKind::Fixed => self.delay,
            BackoffKind::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.delay.saturating_mul(factor)
            }
        };
        delay.min(self.max_delay)
    }

    /// Picks the wait before the next attempt, preferring a server hint.
    pub(crate) fn wait_before_retry(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        match hint {
            Some(hint) => hint.min(self.max_delay),
            None => self.delay_after(attempt),
        }
    }
}

fn secs(value: f64, fallback: f64) -> Duration {
    Duration::try_from_secs_f64(value)
        .or_else(|_| Duration::try_from_secs_f64(fallback))
        .unwrap_or_default()
}

/// Statuses worth another attempt: throttling and server-side failures.
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Reads a server-provided wait hint from `Retry-After` (seconds) or
/// `X-RateLimit-Reset-After` (fractional seconds).
pub fn retry_hint(headers: &HeaderMap) -> Option<Duration> {
    [reqwest::header::RETRY_AFTER.as_str(), RESET_AFTER_HEADER]
        .into_iter()
        .find_map(|name| header_secs(headers, name))
}

/// Parses a header holding a non-negative number of seconds.
pub fn header_secs(headers: &HeaderMap, name: &str) -> Option<Duration> {
    let value = headers.get(name)?.to_str().ok()?.trim().parse::<f64>().ok()?;
    Duration::try_from_secs_f64(value).ok()
}
