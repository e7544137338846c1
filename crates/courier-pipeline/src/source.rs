// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A configured source, resolved into the collaborators the orchestrator runs.

use std::sync::Arc;
use std::time::Duration;

use courier_config::model::{BatchMode, DeliveryConfig, SourceConfig};
use courier_core::{CourierError, SourceCollector, SourceDescriptor, Transformer};
use courier_resilience::RequestExecutor;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Everything needed to process one source in a run.
#[derive(Clone)]
pub struct Source {
    pub descriptor: SourceDescriptor,
    /// Delivery endpoint (webhook URL).
    pub endpoint: String,
    /// Record document holding this source's identities.
    pub document: String,
    pub retention: Duration,
    pub max_item_age: Option<Duration>,
    pub batch: BatchMode,
    pub collector: Arc<dyn SourceCollector>,
    pub transformer: Arc<dyn Transformer>,
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.descriptor.name)
            .field("document", &self.document)
            .field("retention", &self.retention)
            .field("max_item_age", &self.max_item_age)
            .field("batch", &self.batch)
            .field("collector", &self.collector.name())
            .finish_non_exhaustive()
    }
}

impl Source {
    /// A per-item source with a seven-day retention and a document named
    /// after the source.
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        collector: Arc<dyn SourceCollector>,
        transformer: Arc<dyn Transformer>,
    ) -> Self {
        let name = name.into();
        Self {
            document: format!("{name}_record.json"),
            descriptor: SourceDescriptor {
                username: name.clone(),
                name,
            },
            endpoint: endpoint.into(),
            retention: 7 * DAY,
            max_item_age: None,
            batch: BatchMode::PerItem,
            collector,
            transformer,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.descriptor.username = username.into();
        self
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = document.into();
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_max_item_age(mut self, max_item_age: Option<Duration>) -> Self {
        self.max_item_age = max_item_age;
        self
    }

    pub fn with_batch(mut self, batch: BatchMode) -> Self {
        self.batch = batch;
        self
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Resolves a `[[sources]]` entry into its built-in collaborators.
    pub fn from_config(
        config: &SourceConfig,
        delivery: &DeliveryConfig,
        executor: RequestExecutor,
    ) -> Result<Self, CourierError> {
        let endpoint = config.webhook_url.clone().ok_or_else(|| {
            CourierError::Config(format!("source `{}` has no webhook_url", config.name))
        })?;
        let collector = courier_sources::collector_from_config(config, executor)?;
        let transformer = courier_sources::transformer_from_config(config);
        let username = config
            .username
            .clone()
            .unwrap_or_else(|| delivery.default_username.clone());

        Ok(Self::new(&config.name, endpoint, collector, transformer)
            .with_username(username)
            .with_document(config.document_name())
            .with_retention(config.retention())
            .with_max_item_age(config.max_item_age())
            .with_batch(config.batch))
    }
}
