// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier notification relay.
//!
//! [`CourierError`] is the workspace-wide error. The three domain enums
//! ([`AuthError`], [`DeliveryError`], [`StoreError`]) carry the failure classes
//! the orchestrator has to tell apart when deciding whether a run continues.

use thiserror::Error;

/// The primary error type used across all Courier crates.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, missing required values, bad URLs).
    #[error("configuration error: {0}")]
    Config(String),

    /// The credential cache could not produce a usable bearer token.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A notification could not be delivered.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// The dedup record store could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A source collector failed to produce candidate items.
    #[error("source `{source_name}` failed: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    /// A transformer failed to turn items into deliverable content.
    #[error("transform for `{source_name}` failed: {message}")]
    Transform {
        source_name: String,
        message: String,
    },

    /// The run was cancelled (signal or shutdown request).
    #[error("run cancelled")]
    Cancelled,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Returns true when the error belongs to shared infrastructure and the
    /// whole run must stop, rather than only the current source.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            CourierError::Auth(_)
                | CourierError::Store(_)
                | CourierError::Cancelled
                | CourierError::Timeout { .. }
        )
    }
}

/// Failures of the refresh-token grant and of token persistence.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint rejected the grant (e.g. `invalid_grant`). Not retried.
    #[error("token endpoint rejected the grant ({status}): {code}{}", describe(.description))]
    Rejected {
        status: u16,
        code: String,
        description: Option<String>,
    },

    /// The token endpoint stayed unreachable after retries.
    #[error("token endpoint unavailable: {message}")]
    Unavailable { message: String },

    /// The refreshed token could not be read from or written to its cache.
    #[error("token cache persistence failed: {message}")]
    Persist { message: String },

    /// A credential required for the grant is not configured.
    #[error("missing credential `{field}`")]
    Missing { field: String },
}

fn describe(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(" - {d}"))
        .unwrap_or_default()
}

/// Failures of the rate-limited delivery channel.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The endpoint answered with a definitive, non-retryable status.
    #[error("delivery rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Transient failures persisted through every retry attempt.
    #[error("delivery endpoint unavailable after {attempts} attempt(s): {message}")]
    Unavailable { attempts: u32, message: String },

    /// The payload carries neither a body nor structured content.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl DeliveryError {
    /// Returns true when the endpoint itself is unusable, so the remaining
    /// batches of the same source should not be attempted this run.
    pub fn aborts_source(&self) -> bool {
        matches!(self, DeliveryError::Unavailable { .. })
    }
}

/// Failures of the dedup record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing document exists but could not be read.
    #[error("failed to load record document `{document}`: {message}")]
    Load { document: String, message: String },

    /// The backing document could not be written. Newly committed records are at risk.
    #[error("failed to save record document `{document}`: {message}")]
    Save { document: String, message: String },

    /// The backing document was read but is not a valid record map.
    #[error("record document `{document}` is corrupt: {message}")]
    Corrupt { document: String, message: String },
}
