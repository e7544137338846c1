// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RSS and Atom collector backed by `feed-rs`.
//!
//! Entry identity is the SHA-256 of the entry id (the RSS `guid` or Atom
//! `id`), falling back to the first link. The item description wins over
//! full content, which is usually an HTML copy of the whole article.

use async_trait::async_trait;
use courier_core::{CourierError, Item, SourceCollector, identity_for};
use courier_resilience::RequestExecutor;
use feed_rs::model::Entry;
use tracing::{debug, warn};

use crate::fetch::fetch_feed;

const ACCEPT: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8";

fn entry_to_item(entry: Entry) -> Option<Item> {
    let url = entry.links.into_iter().map(|l| l.href).find(|h| !h.trim().is_empty());
    let raw_id = Some(entry.id.trim().to_string())
        .filter(|id| !id.is_empty())
        .or_else(|| url.clone())?;

    let content = entry
        .summary
        .map(|s| s.content)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();

    let mut item = Item::new(identity_for(&raw_id), content.trim().to_string());
    if let Some(title) = entry.title.map(|t| t.content).filter(|t| !t.trim().is_empty()) {
        item = item.with_title(title.trim().to_string());
    }
    if let Some(url) = url {
        item = item.with_url(url);
    }
    if let Some(author) = entry
        .authors
        .into_iter()
        .map(|p| p.name)
        .find(|n| !n.trim().is_empty())
    {
        item = item.with_author(author);
    }
    if let Some(published) = entry.published.or(entry.updated) {
        item = item.with_published_at(published);
    }
    Some(item)
}

/// Collects items from an RSS 2.0, RSS 1.0 or Atom feed URL.
#[derive(Debug, Clone)]
pub struct RssFeedCollector {
    name: String,
    url: String,
    executor: RequestExecutor,
}

impl RssFeedCollector {
    pub fn new(name: impl Into<String>, url: impl Into<String>, executor: RequestExecutor) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            executor,
        }
    }
}

#[async_trait]
impl SourceCollector for RssFeedCollector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collect(&self) -> Result<Vec<Item>, CourierError> {
        let bytes = fetch_feed(&self.executor, &self.name, &self.url, ACCEPT).await?;
        let feed = feed_rs::parser::parse(bytes.as_slice()).map_err(|e| CourierError::Source {
            source_name: self.name.clone(),
            message: format!("feed is not valid RSS or Atom: {e}"),
        })?;

        let total = feed.entries.len();
        let items: Vec<Item> = feed.entries.into_iter().filter_map(entry_to_item).collect();
        if items.len() < total {
            warn!(
                source = %self.name,
                skipped = total - items.len(),
                "feed entries without id or link were skipped"
            );
        }
        debug!(source = %self.name, count = items.len(), "feed collected");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(xml: &str) -> Vec<Item> {
        feed_rs::parser::parse(xml.as_bytes())
            .unwrap()
            .entries
            .into_iter()
            .filter_map(entry_to_item)
            .collect()
    }

    #[test]
    fn guid_is_the_identity() {
        let parsed = items(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>News</title>
              <item>
                <title>Network maintenance</title>
                <link>https://itsc.example.edu/news/42</link>
                <guid isPermaLink="false">news-42</guid>
                <description>Wi-Fi is down on Saturday.</description>
                <pubDate>Wed, 14 Jan 2026 08:00:00 +0800</pubDate>
              </item>
            </channel></rss>"#,
        );

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].identity, identity_for("news-42"));
        assert_eq!(parsed[0].title.as_deref(), Some("Network maintenance"));
        assert_eq!(parsed[0].url.as_deref(), Some("https://itsc.example.edu/news/42"));
        assert_eq!(parsed[0].content, "Wi-Fi is down on Saturday.");
        assert_eq!(
            parsed[0].published_at.unwrap().to_rfc3339(),
            "2026-01-14T00:00:00+00:00"
        );
    }

    #[test]
    fn atom_entries_use_updated_when_unpublished() {
        let parsed = items(
            r#"<?xml version="1.0" encoding="utf-8"?>
            <feed xmlns="http://www.w3.org/2005/Atom">
              <title>Registrar</title>
              <id>urn:registrar</id>
              <updated>2026-01-10T00:00:00Z</updated>
              <entry>
                <title>Exam timetable</title>
                <id>urn:registrar:exam-1</id>
                <link href="https://registrar.example.edu/exam"/>
                <updated>2026-01-12T09:30:00Z</updated>
                <author><name>Registrar Office</name></author>
                <summary>Final timetable released.</summary>
              </entry>
            </feed>"#,
        );

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].identity, identity_for("urn:registrar:exam-1"));
        assert_eq!(parsed[0].author.as_deref(), Some("Registrar Office"));
        assert_eq!(
            parsed[0].published_at.unwrap().to_rfc3339(),
            "2026-01-12T09:30:00+00:00"
        );
    }
}
