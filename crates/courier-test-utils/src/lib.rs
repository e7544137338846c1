// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Provides mock collaborators for fast, deterministic tests without
//! external services.
//!
//! # Components
//!
//! - [`ManualClock`] - Clock that only moves when told to
//! - [`MockCollector`] - Source collector returning scripted items
//! - [`MockTransformer`] - Transformer producing one text payload per item, or nothing
//! - [`MockChannel`] - Delivery channel capturing payloads with scripted failures
//! - [`MemoryBackend`] - In-memory document backend with injectable save failure

pub mod clock;
pub mod memory_backend;
pub mod mock_channel;
pub mod mock_collector;
pub mod mock_transformer;

pub use clock::ManualClock;
pub use memory_backend::MemoryBackend;
pub use mock_channel::{MockChannel, ScriptedFailure};
pub use mock_collector::MockCollector;
pub use mock_transformer::MockTransformer;
