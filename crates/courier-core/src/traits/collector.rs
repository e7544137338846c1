// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source collector trait for anything that yields candidate items.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::Item;

/// Produces candidate items, each with a stable identity.
///
/// Collectors report every item they can see; filtering already-recorded
/// items is the orchestrator's job.
#[async_trait]
pub trait SourceCollector: Send + Sync + 'static {
    /// Returns a short, human-readable name for logs.
    fn name(&self) -> &str;

    /// Fetches the current candidate items.
    async fn collect(&self) -> Result<Vec<Item>, CourierError>;
}
