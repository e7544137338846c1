// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transformers that format items without summarising them.

use async_trait::async_trait;
use chrono::SecondsFormat;
use courier_core::{
    CourierError, DeliveryPayload, Embed, EmbedAuthor, EmbedFooter, Item, SourceDescriptor,
    Summary, Transformer,
};
use courier_discord::{MAX_CONTENT_CHARS, MAX_DESCRIPTION_CHARS, chunk_text, truncate_chars};

/// Maximum characters in an embed title.
pub const MAX_TITLE_CHARS: usize = 256;

/// One embed per item.
#[derive(Debug, Clone, Default)]
pub struct EmbedTransformer {
    color: Option<u32>,
}

impl EmbedTransformer {
    pub fn new(color: Option<u32>) -> Self {
        Self { color }
    }

    fn embed_for(&self, source: &SourceDescriptor, item: &Item) -> Embed {
        let description = Some(item.content.trim())
            .filter(|c| !c.is_empty())
            .map(|c| truncate_chars(c, MAX_DESCRIPTION_CHARS));
        Embed {
            title: item
                .title
                .as_deref()
                .map(|t| truncate_chars(t, MAX_TITLE_CHARS)),
            description,
            url: item.url.clone(),
            color: self.color,
            author: item.author.as_ref().map(|name| EmbedAuthor {
                name: name.clone(),
                icon_url: None,
            }),
            footer: Some(EmbedFooter {
                text: source.name.clone(),
            }),
            timestamp: item
                .published_at
                .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

#[async_trait]
impl Transformer for EmbedTransformer {
    async fn transform(
        &self,
        source: &SourceDescriptor,
        items: &[Item],
    ) -> Result<Summary, CourierError> {
        let payloads = items
            .iter()
            .filter(|item| item.title.is_some() || !item.content.trim().is_empty())
            .map(|item| DeliveryPayload::embed(self.embed_for(source, item), &source.username))
            .collect();
        Ok(Summary::from_payloads(payloads))
    }
}

/// Plain text: every item of the batch in one digest, split into as many
/// messages as the endpoint's size limit requires.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTransformer;

impl TextTransformer {
    pub fn new() -> Self {
        Self
    }
}

fn render_item(item: &Item) -> String {
    let mut lines = Vec::new();
    if let Some(title) = item.title.as_deref().filter(|t| !t.trim().is_empty()) {
        lines.push(format!("**{}**", title.trim()));
    }
    let content = item.content.trim();
    if !content.is_empty() {
        lines.push(content.to_string());
    }
    if let Some(url) = &item.url {
        lines.push(format!("<{url}>"));
    }
    lines.join("\n")
}

#[async_trait]
impl Transformer for TextTransformer {
    async fn transform(
        &self,
        source: &SourceDescriptor,
        items: &[Item],
    ) -> Result<Summary, CourierError> {
        let digest = items
            .iter()
            .map(render_item)
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        let payloads = chunk_text(&digest, MAX_CONTENT_CHARS)
            .into_iter()
            .map(|chunk| DeliveryPayload::text(chunk, &source.username))
            .collect();
        Ok(Summary::from_payloads(payloads))
    }
}
