// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock source collector returning scripted items.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::{CourierError, Item, SourceCollector};

/// A collector whose output is set by the test.
#[derive(Debug, Clone)]
pub struct MockCollector {
    name: String,
    items: Arc<Mutex<Vec<Item>>>,
    failure: Arc<Mutex<Option<String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockCollector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A collector returning one item per identity, with `"item <id>"` as content.
    pub fn with_identities(name: impl Into<String>, identities: &[&str]) -> Self {
        let items = identities
            .iter()
            .map(|id| Item::new(*id, format!("item {id}")).with_title(format!("item {id}")))
            .collect();
        Self {
            items: Arc::new(Mutex::new(items)),
            ..Self::new(name)
        }
    }

    pub async fn set_items(&self, items: Vec<Item>) {
        *self.items.lock().await = items;
    }

    /// Makes `collect` fail with `message` (or succeed again with `None`).
    pub async fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock().await = message.map(str::to_string);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceCollector for MockCollector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collect(&self) -> Result<Vec<Item>, CourierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.lock().await.clone() {
            return Err(CourierError::Source {
                source_name: self.name.clone(),
                message,
            });
        }
        Ok(self.items.lock().await.clone())
    }
}
