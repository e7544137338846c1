// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Orchestration for the Courier notification relay.
//!
//! For every configured source the [`Orchestrator`] fetches candidate items,
//! drops those already recorded, transforms the rest, delivers them and only
//! then commits their identities to the source's record document.

pub mod orchestrator;
pub mod report;
pub mod shutdown;
pub mod source;

pub use orchestrator::Orchestrator;
pub use report::{RunReport, SourceOutcome, SourceReport, SourceStats};
pub use shutdown::install_signal_handler;
pub use source::Source;
