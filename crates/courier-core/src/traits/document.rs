// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document backend trait for wholesale-read, wholesale-written JSON documents.

use async_trait::async_trait;

use crate::error::StoreError;

/// Reads and overwrites whole named documents.
///
/// There are no partial writes: `write` replaces the entire document.
#[async_trait]
pub trait DocumentBackend: Send + Sync + 'static {
    /// Describes where documents live, for logs.
    fn describe(&self) -> String;

    /// Returns the document bytes, or `None` when the document does not exist.
    async fn read(&self, document: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces the document with `bytes`.
    async fn write(&self, document: &str, bytes: Vec<u8>) -> Result<(), StoreError>;
}
