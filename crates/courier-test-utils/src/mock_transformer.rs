// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transformer with a switchable "nothing of value" outcome.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use courier_core::{
    CourierError, DeliveryPayload, Item, SourceDescriptor, Summary, Transformer,
};

/// Turns each item's content into one text payload.
#[derive(Debug, Clone, Default)]
pub struct MockTransformer {
    empty: Arc<AtomicBool>,
    fail: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MockTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call report [`Summary::Empty`].
    pub fn report_empty(&self, empty: bool) {
        self.empty.store(empty, Ordering::SeqCst);
    }

    /// Makes every call fail with a transform error.
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transformer for MockTransformer {
    async fn transform(
        &self,
        source: &SourceDescriptor,
        items: &[Item],
    ) -> Result<Summary, CourierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CourierError::Transform {
                source_name: source.name.clone(),
                message: "simulated transform failure".to_string(),
            });
        }
        if self.empty.load(Ordering::SeqCst) {
            return Ok(Summary::Empty);
        }
        Ok(Summary::from_payloads(
            items
                .iter()
                .map(|item| DeliveryPayload::text(item.content.clone(), source.username.clone()))
                .collect(),
        ))
    }
}
