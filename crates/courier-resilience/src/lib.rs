// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for the Courier notification relay.
//!
//! [`RequestExecutor`] wraps any [`reqwest::Request`] with bounded retry,
//! fixed or exponential backoff, and an independent timeout per attempt.
//! The credential cache, the record store's remote backend, the feed
//! collector and the webhook channel all share one executor.

pub mod executor;
pub mod policy;

pub use executor::{RequestError, RequestExecutor, client_builder, redact_url};
pub use policy::{RetryPolicy, header_secs, is_transient_status, retry_hint};
