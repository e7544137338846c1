// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wholesale load and save of record documents.

use courier_core::{DocumentBackend, StoreError};
use tracing::{debug, error};

use crate::record::RecordStore;

/// Reads a whole record document. A document that does not exist yet is an
/// empty store; any other failure is an error, because treating it as empty
/// would let the next save erase every record.
pub async fn load(backend: &dyn DocumentBackend, document: &str) -> Result<RecordStore, StoreError> {
    match backend.read(document).await? {
        Some(bytes) => {
            let store = RecordStore::from_json(document, &bytes)?;
            debug!(document, records = store.len(), "record document loaded");
            Ok(store)
        }
        None => Ok(RecordStore::new()),
    }
}

/// Overwrites a record document with `store`.
pub async fn save(
    backend: &dyn DocumentBackend,
    document: &str,
    store: &RecordStore,
) -> Result<(), StoreError> {
    let bytes = store.to_json(document)?;
    match backend.write(document, bytes).await {
        Ok(()) => {
            debug!(document, records = store.len(), "record document saved");
            Ok(())
        }
        Err(e) => {
            error!(document, backend = %backend.describe(), error = %e, "failed to save record document");
            Err(e)
        }
    }
}
