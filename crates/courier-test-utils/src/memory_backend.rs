// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory document backend for deterministic store tests.
//!
//! `MemoryBackend` implements `DocumentBackend` over a map of document names
//! to bytes. Saves can be made to fail, which simulates a crash between
//! delivery and commit: everything before the save happened, the save did not.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::{DocumentBackend, StoreError};

/// A shared, cloneable in-memory document backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    documents: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_saves: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document as if written by an earlier run.
    pub async fn insert(&self, document: &str, bytes: impl Into<Vec<u8>>) {
        self.documents
            .lock()
            .await
            .insert(document.to_string(), bytes.into());
    }

    /// Returns the current bytes of a document.
    pub async fn get(&self, document: &str) -> Option<Vec<u8>> {
        self.documents.lock().await.get(document).cloned()
    }

    /// Makes every following `write` fail (or succeed again).
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn read(&self, document: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(document).await)
    }

    async fn write(&self, document: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Save {
                document: document.to_string(),
                message: "simulated save failure".to_string(),
            });
        }
        self.documents
            .lock()
            .await
            .insert(document.to_string(), bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_save_leaves_document_untouched() {
        let backend = MemoryBackend::new();
        backend.insert("a.json", b"{}".to_vec()).await;
        backend.fail_saves(true);

        let result = backend.write("a.json", b"{\"x\":1}".to_vec()).await;
        assert!(matches!(result, Err(StoreError::Save { .. })));
        assert_eq!(backend.get("a.json").await.as_deref(), Some(&b"{}"[..]));
        assert_eq!(backend.write_count(), 0);
    }
}
