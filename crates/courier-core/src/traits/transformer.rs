// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transformer trait for turning raw items into deliverable content.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::{Item, SourceDescriptor, Summary};

/// Converts one batch of items into notification payloads.
///
/// Returning [`Summary::Empty`] is a valid outcome, not an error.
#[async_trait]
pub trait Transformer: Send + Sync + 'static {
    async fn transform(
        &self,
        source: &SourceDescriptor,
        items: &[Item],
    ) -> Result<Summary, CourierError>;
}
