// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook delivery with proactive per-endpoint rate limiting.

use async_trait::async_trait;
use courier_core::{DeliveryChannel, DeliveryError, DeliveryPayload};
use courier_resilience::policy::RESET_AFTER_HEADER;
use courier_resilience::{RequestError, RequestExecutor, header_secs, redact_url};
use reqwest::header::HeaderMap;
use tracing::{debug, info, warn};

use crate::cooldown::CooldownRegistry;
use crate::wire::WebhookBody;

/// Header carrying the number of requests left in the current window.
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Sends notifications to webhook URLs.
///
/// After every successful send the rate-limit headers are inspected; when the
/// window is about to run out, the next send to the same URL first waits for
/// the advertised reset. Transient failures (connection errors, 429, 5xx) are
/// retried by the shared [`RequestExecutor`].
#[derive(Debug)]
pub struct WebhookChannel {
    executor: RequestExecutor,
    cooldowns: CooldownRegistry,
}

impl WebhookChannel {
    pub fn new(executor: RequestExecutor) -> Self {
        Self {
            executor,
            cooldowns: CooldownRegistry::new(),
        }
    }
}

#[async_trait]
impl DeliveryChannel for WebhookChannel {
    async fn send(&self, endpoint: &str, payload: &DeliveryPayload) -> Result<(), DeliveryError> {
        let body = WebhookBody::from_payload(payload)?;

        let request = self
            .executor
            .client()
            .post(endpoint)
            .json(&body)
            .build()
            .map_err(|e| DeliveryError::Unavailable {
                attempts: 0,
                message: format!("could not build webhook request: {e}"),
            })?;
        let target = redact_url(request.url());

        let slot = self.cooldowns.slot(endpoint);
        let mut cooldown = slot.lock().await;
        cooldown.wait().await;

        let response = self
            .executor
            .execute(request)
            .await
            .map_err(|e| map_request_error(&target, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint = %target, %status, "webhook answered with unexpected status");
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        if let Some(wait) = cooldown_after(response.headers()) {
            info!(
                endpoint = %target,
                wait_ms = wait.as_millis() as u64,
                "rate-limit window nearly used up, cooling down"
            );
            cooldown.arm(wait);
        }

        debug!(endpoint = %target, sender = %payload.sender, "notification delivered");
        Ok(())
    }
}

/// Cooldown to apply before the next send, if the window is nearly spent.
fn cooldown_after(headers: &HeaderMap) -> Option<std::time::Duration> {
    let remaining = headers
        .get(REMAINING_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()?;
    if remaining > 1 {
        return None;
    }
    header_secs(headers, RESET_AFTER_HEADER)
}

fn map_request_error(target: &str, err: RequestError) -> DeliveryError {
    match err {
        RequestError::Rejected { status, body, .. } => {
            warn!(endpoint = %target, %status, "webhook rejected notification");
            DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            }
        }
        RequestError::Exhausted { attempts, last } => DeliveryError::Unavailable {
            attempts,
            message: last,
        },
        RequestError::Build(e) => DeliveryError::Unavailable {
            attempts: 0,
            message: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use std::time::Duration;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn last_request_in_window_triggers_cooldown() {
        let h = headers(&[(REMAINING_HEADER, "1"), (RESET_AFTER_HEADER, "2.5")]);
        assert_eq!(cooldown_after(&h), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn exhausted_window_also_triggers_cooldown() {
        let h = headers(&[(REMAINING_HEADER, "0"), (RESET_AFTER_HEADER, "1")]);
        assert_eq!(cooldown_after(&h), Some(Duration::from_secs(1)));
    }

    #[test]
    fn plenty_remaining_means_no_cooldown() {
        let h = headers(&[(REMAINING_HEADER, "4"), (RESET_AFTER_HEADER, "2")]);
        assert_eq!(cooldown_after(&h), None);
    }

    #[test]
    fn missing_or_garbled_headers_mean_no_cooldown() {
        assert_eq!(cooldown_after(&HeaderMap::new()), None);
        assert_eq!(cooldown_after(&headers(&[(REMAINING_HEADER, "1")])), None);
        assert_eq!(
            cooldown_after(&headers(&[(REMAINING_HEADER, "soon"), (RESET_AFTER_HEADER, "2")])),
            None
        );
    }
}
