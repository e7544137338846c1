// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-source outcomes of one run.

use std::fmt;

/// Counters gathered while processing one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// Items the collector reported.
    pub collected: usize,
    /// Items not yet recorded and young enough to deliver.
    pub new: usize,
    /// Items skipped for being older than the source's age cutoff.
    pub too_old: usize,
    /// Records removed by the retention prune.
    pub pruned: usize,
    /// Payloads the channel accepted.
    pub delivered: usize,
    /// Identities committed to the record store.
    pub committed: usize,
    /// Batches the transformer reported as having nothing to send.
    pub empty_batches: usize,
    /// Batches that were not committed because something failed.
    pub failed_batches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Succeeded,
    /// The source failed; everything delivered before the failure was committed.
    Failed(String),
    /// The run was aborted before this source was reached.
    NotRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub stats: SourceStats,
    pub outcome: SourceOutcome,
}

impl SourceReport {
    pub fn failed(&self) -> bool {
        !matches!(self.outcome, SourceOutcome::Succeeded)
    }
}

/// Result of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    /// Set when shared infrastructure failed, or the run was cancelled or
    /// timed out, and the remaining sources were skipped.
    pub aborted: Option<String>,
}

impl RunReport {
    /// True when every source succeeded and the run was not aborted.
    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.sources.iter().all(|s| !s.failed())
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| s.failed())
    }

    pub fn source(&self, name: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.name == name)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for source in &self.sources {
            let status = match &source.outcome {
                SourceOutcome::Succeeded => "ok".to_string(),
                SourceOutcome::Failed(error) => format!("failed: {error}"),
                SourceOutcome::NotRun => "not run".to_string(),
            };
            writeln!(
                f,
                "{}: {} delivered, {} committed, {} new, {} pruned ({status})",
                source.name,
                source.stats.delivered,
                source.stats.committed,
                source.stats.new,
                source.stats.pruned,
            )?;
        }
        if let Some(reason) = &self.aborted {
            writeln!(f, "run aborted: {reason}")?;
        }
        Ok(())
    }
}
