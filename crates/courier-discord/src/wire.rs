// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook request body and the endpoint's size limits.

use courier_core::{DeliveryError, DeliveryPayload, Embed};
use serde::Serialize;

/// Maximum characters in a message's `content`.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Maximum characters in an embed description.
pub const MAX_DESCRIPTION_CHARS: usize = 4096;

/// JSON body of a webhook `POST`.
///
/// `content` is sent as `null` for embed-only messages; `embeds` is omitted
/// when there are none.
#[derive(Debug, Serialize)]
pub struct WebhookBody<'a> {
    pub content: Option<&'a str>,
    pub username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<&'a Embed>>,
}

impl<'a> WebhookBody<'a> {
    /// Builds the wire body, refusing payloads the endpoint would reject.
    pub fn from_payload(payload: &'a DeliveryPayload) -> Result<Self, DeliveryError> {
        payload.validate()?;

        let content = payload.body.as_deref().filter(|b| !b.trim().is_empty());
        if let Some(content) = content {
            let chars = content.chars().count();
            if chars > MAX_CONTENT_CHARS {
                return Err(DeliveryError::InvalidPayload(format!(
                    "content is {chars} characters, limit is {MAX_CONTENT_CHARS}"
                )));
            }
        }

        Ok(Self {
            content,
            username: &payload.sender,
            embeds: payload.embed.as_ref().map(|embed| vec![embed]),
        })
    }
}

/// Splits text into chunks of at most `max_chars` characters.
///
/// Prefers paragraph breaks, then line breaks, then spaces; a run without any
/// of them is split hard at the limit.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        let (chunk, remainder) = split_at_boundary(rest, max_chars);
        let chunk = chunk.trim_end();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        rest = remainder.trim_start();
    }

    chunks
}

fn split_at_boundary(text: &str, max_chars: usize) -> (&str, &str) {
    let Some((limit, _)) = text.char_indices().nth(max_chars) else {
        return (text, "");
    };

    let search_region = &text[..limit];

    if let Some(pos) = search_region.rfind("\n\n").filter(|&p| p > 0) {
        return (&text[..pos], &text[pos + 2..]);
    }
    if let Some(pos) = search_region.rfind('\n').filter(|&p| p > 0) {
        return (&text[..pos], &text[pos + 1..]);
    }
    if let Some(pos) = search_region.rfind(' ').filter(|&p| p > 0) {
        return (&text[..pos], &text[pos + 1..]);
    }

    (&text[..limit], &text[limit..])
}

/// Shortens `text` to at most `max_chars` characters, ending in an ellipsis
/// when anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}
