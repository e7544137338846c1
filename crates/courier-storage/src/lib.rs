// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dedup record store for the Courier notification relay.
//!
//! A record store maps item identities to the time they were first seen. It
//! is read whole at the start of a source's run, mutated in memory (prune,
//! commit) and written whole after each delivered batch. Persistence goes
//! through a [`DocumentBackend`]: a local directory or a remote document API.

pub mod backend;
pub mod persist;
pub mod record;

use std::sync::Arc;

use courier_auth::CredentialCache;
use courier_config::model::{StorageBackendKind, StorageConfig};
use courier_core::{CourierError, DocumentBackend};
use courier_resilience::RequestExecutor;

pub use backend::{LocalFileBackend, RemoteDocumentBackend};
pub use persist::{load, save};
pub use record::{RecordStore, parse_timestamp};

/// Builds the backend selected by `[storage]`.
///
/// The remote backend needs the credential cache; its absence is a
/// configuration error.
pub fn backend_from_config(
    config: &StorageConfig,
    executor: RequestExecutor,
    credentials: Option<Arc<CredentialCache>>,
) -> Result<Arc<dyn DocumentBackend>, CourierError> {
    match config.backend {
        StorageBackendKind::Local => Ok(Arc::new(LocalFileBackend::new(&config.directory))),
        StorageBackendKind::Remote => {
            let template = config.url_template.as_deref().ok_or_else(|| {
                CourierError::Config("storage.url_template is required for the remote backend".into())
            })?;
            let credentials = credentials.ok_or_else(|| {
                CourierError::Config("the remote backend requires an [oauth] section".into())
            })?;
            Ok(Arc::new(RemoteDocumentBackend::new(
                template, executor, credentials,
            )))
        }
    }
}
