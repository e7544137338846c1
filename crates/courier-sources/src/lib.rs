// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in collaborators for the Courier notification relay.
//!
//! A source pairs a collector (where items come from) with a transformer
//! (how they are shown). Summarising transformers live outside this crate
//! and plug in through [`courier_core::Transformer`].

pub mod feed;
mod fetch;
pub mod rss;
pub mod transform;

use std::sync::Arc;

use courier_config::model::{CollectorKind, SourceConfig, TransformKind};
use courier_core::{CourierError, SourceCollector, Transformer};
use courier_resilience::RequestExecutor;

pub use feed::JsonFeedCollector;
pub use rss::RssFeedCollector;
pub use transform::{EmbedTransformer, TextTransformer};

/// Builds the collector named by a source's `kind`.
pub fn collector_from_config(
    source: &SourceConfig,
    executor: RequestExecutor,
) -> Result<Arc<dyn SourceCollector>, CourierError> {
    let url = source.url.as_deref().ok_or_else(|| {
        CourierError::Config(format!("source `{}` needs a feed url", source.name))
    })?;
    let collector: Arc<dyn SourceCollector> = match source.kind {
        CollectorKind::JsonFeed => Arc::new(JsonFeedCollector::new(&source.name, url, executor)),
        CollectorKind::Rss => Arc::new(RssFeedCollector::new(&source.name, url, executor)),
    };
    Ok(collector)
}

/// Builds the transformer named by a source's `transform`.
pub fn transformer_from_config(source: &SourceConfig) -> Arc<dyn Transformer> {
    match source.transform {
        TransformKind::Embed => Arc::new(EmbedTransformer::new(source.color)),
        TransformKind::Text => Arc::new(TextTransformer::new()),
    }
}
