// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Every seam the orchestrator talks through is an `#[async_trait]` trait so
//! concrete adapters can be swapped for mocks in tests.

pub mod collector;
pub mod delivery;
pub mod document;
pub mod transformer;

pub use collector::SourceCollector;
pub use delivery::DeliveryChannel;
pub use document::DocumentBackend;
pub use transformer::Transformer;
