// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by collectors, transformers, the delivery channel and
//! the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::DeliveryError;

/// Point in time used for record bookkeeping. Always UTC.
pub type Timestamp = DateTime<Utc>;

/// Derives a stable identity from an upstream id that may be long or unstable
/// in shape (URLs, GUIDs with whitespace, etc.). Lowercase hex SHA-256.
pub fn identity_for(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    hex::encode(digest)
}

/// A candidate item produced by a source collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Stable identity used as the dedup key.
    pub identity: String,
    /// Raw content handed to the transformer.
    pub content: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub author: Option<String>,
    /// Upstream publication time, when the source reports one.
    pub published_at: Option<Timestamp>,
}

impl Item {
    /// Creates an item with only an identity and raw content.
    pub fn new(identity: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            content: content.into(),
            title: None,
            url: None,
            author: None,
            published_at: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_published_at(mut self, published_at: Timestamp) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

/// Static facts about a configured source, passed to its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Unique source name (also used in logs and the run report).
    pub name: String,
    /// Sender label shown on delivered notifications.
    pub username: String,
}

/// Author block of an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Footer block of an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Structured notification content rendered as a rich card by the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    /// RFC 3339 timestamp shown next to the footer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// One notification to deliver. Carries at least one of `body` or `embed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryPayload {
    pub body: Option<String>,
    pub embed: Option<Embed>,
    pub sender: String,
}

impl DeliveryPayload {
    /// A plain-text notification.
    pub fn text(body: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            embed: None,
            sender: sender.into(),
        }
    }

    /// A notification carrying only structured content.
    pub fn embed(embed: Embed, sender: impl Into<String>) -> Self {
        Self {
            body: None,
            embed: Some(embed),
            sender: sender.into(),
        }
    }

    /// Checks the payload invariant before it goes on the wire.
    pub fn validate(&self) -> Result<(), DeliveryError> {
        let has_body = self.body.as_deref().is_some_and(|b| !b.trim().is_empty());
        if !has_body && self.embed.is_none() {
            return Err(DeliveryError::InvalidPayload(
                "payload needs a body or structured content".into(),
            ));
        }
        Ok(())
    }
}

/// Result of a transform step.
///
/// `Empty` is an expected outcome ("nothing worth sending"): the batch ends
/// without delivery and without committing its identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    Available(Vec<DeliveryPayload>),
    Empty,
}

impl Summary {
    /// Wraps payloads, collapsing an empty list into [`Summary::Empty`].
    pub fn from_payloads(payloads: Vec<DeliveryPayload>) -> Self {
        if payloads.is_empty() {
            Summary::Empty
        } else {
            Summary::Available(payloads)
        }
    }
}
