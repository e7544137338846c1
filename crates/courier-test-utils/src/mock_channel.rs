// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock delivery channel for deterministic testing.
//!
//! `MockChannel` implements `DeliveryChannel`, capturing every delivered
//! payload and failing sends whose text matches a scripted rule.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::{DeliveryChannel, DeliveryError, DeliveryPayload};

/// A failure the mock produces instead of delivering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedFailure {
    Rejected { status: u16, body: String },
    Unavailable,
}

impl ScriptedFailure {
    fn to_error(&self) -> DeliveryError {
        match self {
            ScriptedFailure::Rejected { status, body } => DeliveryError::Rejected {
                status: *status,
                body: body.clone(),
            },
            ScriptedFailure::Unavailable => DeliveryError::Unavailable {
                attempts: 3,
                message: "simulated outage".to_string(),
            },
        }
    }
}

/// A delivery channel that records what it was asked to send.
#[derive(Debug, Clone, Default)]
pub struct MockChannel {
    sent: Arc<Mutex<Vec<(String, DeliveryPayload)>>>,
    attempts: Arc<Mutex<usize>>,
    rules: Arc<Mutex<Vec<(String, ScriptedFailure)>>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every payload whose body or embed title/description contains `needle`.
    pub async fn fail_when_contains(&self, needle: &str, failure: ScriptedFailure) {
        self.rules.lock().await.push((needle.to_string(), failure));
    }

    /// Payloads delivered successfully, with the endpoint they went to.
    pub async fn sent(&self) -> Vec<(String, DeliveryPayload)> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Every `send` call, successful or not.
    pub async fn attempt_count(&self) -> usize {
        *self.attempts.lock().await
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

fn payload_text(payload: &DeliveryPayload) -> String {
    let mut text = payload.body.clone().unwrap_or_default();
    if let Some(embed) = &payload.embed {
        for part in [&embed.title, &embed.description].into_iter().flatten() {
            text.push('\n');
            text.push_str(part);
        }
    }
    text
}

#[async_trait]
impl DeliveryChannel for MockChannel {
    async fn send(&self, endpoint: &str, payload: &DeliveryPayload) -> Result<(), DeliveryError> {
        *self.attempts.lock().await += 1;
        payload.validate()?;

        let text = payload_text(payload);
        if let Some((_, failure)) = self
            .rules
            .lock()
            .await
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
        {
            return Err(failure.to_error());
        }

        self.sent
            .lock()
            .await
            .push((endpoint.to_string(), payload.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_rejection_is_not_recorded() {
        let channel = MockChannel::new();
        channel
            .fail_when_contains(
                "item c",
                ScriptedFailure::Rejected {
                    status: 400,
                    body: "bad".into(),
                },
            )
            .await;

        channel
            .send("hook", &DeliveryPayload::text("item a", "News"))
            .await
            .unwrap();
        let err = channel
            .send("hook", &DeliveryPayload::text("item c", "News"))
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Rejected { status: 400, .. }));
        assert_eq!(channel.sent_count().await, 1);
        assert_eq!(channel.attempt_count().await, 2);
    }
}
