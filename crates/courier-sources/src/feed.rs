// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON Feed collector.
//!
//! Reads a [JSON Feed](https://jsonfeed.org/version/1.1) document over HTTP
//! and turns each entry into an [`Item`]. Identities are the SHA-256 of the
//! entry's `id` (or its `url` when the id is missing), so long or oddly
//! shaped upstream ids still make compact record keys.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_core::{CourierError, Item, SourceCollector, identity_for};
use courier_resilience::RequestExecutor;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::fetch::fetch_feed;

#[derive(Debug, Deserialize)]
struct FeedDocument {
    #[serde(default)]
    items: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content_text: Option<String>,
    #[serde(default)]
    content_html: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    date_published: Option<String>,
    /// JSON Feed 1.1.
    #[serde(default)]
    authors: Vec<FeedAuthor>,
    /// JSON Feed 1.0.
    #[serde(default)]
    author: Option<FeedAuthor>,
}

#[derive(Debug, Deserialize)]
struct FeedAuthor {
    #[serde(default)]
    name: Option<String>,
}

impl FeedEntry {
    fn raw_id(&self) -> Option<String> {
        let id = match &self.id {
            Some(serde_json::Value::String(s)) => Some(s.trim().to_string()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        id.filter(|s| !s.is_empty())
            .or_else(|| self.url.clone().filter(|u| !u.trim().is_empty()))
    }

    fn into_item(self) -> Option<Item> {
        let raw_id = self.raw_id()?;
        let content = self
            .content_text
            .or(self.summary)
            .or(self.content_html)
            .unwrap_or_default();

        let mut item = Item::new(identity_for(&raw_id), content);
        if let Some(title) = self.title.filter(|t| !t.trim().is_empty()) {
            item = item.with_title(title);
        }
        if let Some(url) = self.url {
            item = item.with_url(url);
        }
        let author = self
            .authors
            .into_iter()
            .chain(self.author)
            .find_map(|a| a.name);
        if let Some(author) = author {
            item = item.with_author(author);
        }
        if let Some(published) = self.date_published.as_deref().and_then(parse_published) {
            item = item.with_published_at(published);
        }
        Some(item)
    }
}

fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            debug!(value = raw, error = %e, "ignoring unparseable date_published");
            None
        }
    }
}

/// Collects items from a JSON Feed URL.
#[derive(Debug, Clone)]
pub struct JsonFeedCollector {
    name: String,
    url: String,
    executor: RequestExecutor,
}

impl JsonFeedCollector {
    pub fn new(name: impl Into<String>, url: impl Into<String>, executor: RequestExecutor) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            executor,
        }
    }
}

#[async_trait]
impl SourceCollector for JsonFeedCollector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collect(&self) -> Result<Vec<Item>, CourierError> {
        let bytes = fetch_feed(
            &self.executor,
            &self.name,
            &self.url,
            "application/feed+json, application/json",
        )
        .await?;
        let document: FeedDocument =
            serde_json::from_slice(&bytes).map_err(|e| CourierError::Source {
                source_name: self.name.clone(),
                message: format!("feed is not valid JSON Feed: {e}"),
            })?;

        let total = document.items.len();
        let items: Vec<Item> = document
            .items
            .into_iter()
            .filter_map(FeedEntry::into_item)
            .collect();
        if items.len() < total {
            warn!(
                source = %self.name,
                skipped = total - items.len(),
                "feed entries without id or url were skipped"
            );
        }
        debug!(source = %self.name, count = items.len(), "feed collected");
        Ok(items)
    }
}
