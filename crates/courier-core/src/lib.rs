// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier notification relay.
//!
//! This crate provides the error taxonomy, shared types and collaborator
//! traits used throughout the Courier workspace. Collectors, transformers,
//! delivery channels and document backends all implement traits defined here.

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, SystemClock};
pub use error::{AuthError, CourierError, DeliveryError, StoreError};
pub use types::{
    DeliveryPayload, Embed, EmbedAuthor, EmbedFooter, Item, SourceDescriptor, Summary, Timestamp,
    identity_for,
};

pub use traits::{DeliveryChannel, DocumentBackend, SourceCollector, Transformer};
