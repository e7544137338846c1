// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-run pipeline: fetch, filter, transform, deliver, commit.
//!
//! Identities are committed only after every payload of their batch was
//! accepted by the channel, and the store is saved right after each commit.
//! An interruption between delivery and commit therefore repeats a
//! notification on the next run instead of losing it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use courier_config::model::BatchMode;
use courier_core::{
    Clock, CourierError, DeliveryChannel, DocumentBackend, Item, Summary, Timestamp,
};
use courier_storage::{RecordStore, load, save};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::report::{RunReport, SourceOutcome, SourceReport, SourceStats};
use crate::source::Source;

enum BatchOutcome {
    Delivered,
    Empty,
}

/// Runs sources one after another against a shared channel and backend.
pub struct Orchestrator {
    channel: Arc<dyn DeliveryChannel>,
    backend: Arc<dyn DocumentBackend>,
    clock: Arc<dyn Clock>,
    run_timeout: Option<Duration>,
}

impl Orchestrator {
    pub fn new(
        channel: Arc<dyn DeliveryChannel>,
        backend: Arc<dyn DocumentBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            channel,
            backend,
            clock,
            run_timeout: None,
        }
    }

    /// Bounds the whole run. Sources still pending at the deadline are skipped
    /// and the batch in flight is not committed.
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }

    /// Processes every source in order.
    ///
    /// Failures local to a source are recorded and the next source runs.
    /// Auth and store failures, cancellation and the run timeout abort the
    /// run; the remaining sources are reported as not run.
    pub async fn run(&self, sources: &[Source], cancel: &CancellationToken) -> RunReport {
        let deadline = self.run_timeout.map(|t| (Instant::now() + t, t));
        let mut report = RunReport::default();

        for source in sources {
            if report.aborted.is_some() {
                report.sources.push(SourceReport {
                    name: source.name().to_string(),
                    stats: SourceStats::default(),
                    outcome: SourceOutcome::NotRun,
                });
                continue;
            }

            info!(source = %source.name(), "processing source");
            let mut stats = SourceStats::default();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(CourierError::Cancelled),
                duration = expire(deadline) => Err(CourierError::Timeout { duration }),
                result = self.run_source(source, &mut stats) => result,
            };

            let outcome = match result {
                Ok(()) => {
                    info!(
                        source = %source.name(),
                        delivered = stats.delivered,
                        committed = stats.committed,
                        pruned = stats.pruned,
                        "source completed"
                    );
                    SourceOutcome::Succeeded
                }
                Err(e) if e.is_run_fatal() => {
                    error!(source = %source.name(), error = %e, "aborting run");
                    report.aborted = Some(e.to_string());
                    SourceOutcome::Failed(e.to_string())
                }
                Err(e) => {
                    warn!(source = %source.name(), error = %e, "source failed");
                    SourceOutcome::Failed(e.to_string())
                }
            };

            report.sources.push(SourceReport {
                name: source.name().to_string(),
                stats,
                outcome,
            });
        }

        report
    }

    async fn run_source(&self, source: &Source, stats: &mut SourceStats) -> Result<(), CourierError> {
        let backend = self.backend.as_ref();
        let mut store = load(backend, &source.document).await?;
        stats.pruned = store.prune(source.retention, self.clock.now());
        if stats.pruned > 0 {
            debug!(source = %source.name(), pruned = stats.pruned, "pruned expired records");
        }

        let mut saved = false;
        let outcome = self
            .deliver_new(source, &mut store, &mut saved, stats)
            .await;

        let fatal = outcome.as_ref().is_err_and(CourierError::is_run_fatal);
        if stats.pruned > 0 && !saved && !fatal {
            save(backend, &source.document, &store).await?;
        }
        outcome
    }

    async fn deliver_new(
        &self,
        source: &Source,
        store: &mut RecordStore,
        saved: &mut bool,
        stats: &mut SourceStats,
    ) -> Result<(), CourierError> {
        let items = source.collector.collect().await?;
        stats.collected = items.len();

        let fresh = self.filter_new(source, store, items, stats);
        stats.new = fresh.len();
        if fresh.is_empty() {
            debug!(source = %source.name(), "nothing new");
            return Ok(());
        }

        let batches: Vec<Vec<Item>> = match source.batch {
            BatchMode::PerItem => fresh.into_iter().map(|item| vec![item]).collect(),
            BatchMode::Combined => vec![fresh],
        };

        let mut first_failure = None;
        for batch in &batches {
            match self.deliver_batch(source, batch, stats).await {
                Ok(BatchOutcome::Delivered) => {
                    let identities = batch.iter().map(|item| item.identity.as_str());
                    stats.committed += store.commit(identities, self.clock.now());
                    save(self.backend.as_ref(), &source.document, store).await?;
                    *saved = true;
                }
                Ok(BatchOutcome::Empty) => {
                    debug!(source = %source.name(), items = batch.len(), "nothing worth sending");
                    stats.empty_batches += 1;
                }
                Err(e) if e.is_run_fatal() => return Err(e),
                Err(e) => {
                    stats.failed_batches += 1;
                    let abort = matches!(&e, CourierError::Delivery(d) if d.aborts_source());
                    let identity = batch.first().map(|i| i.identity.as_str()).unwrap_or_default();
                    warn!(
                        source = %source.name(),
                        identity,
                        error = %e,
                        "batch not delivered, identities left uncommitted"
                    );
                    first_failure.get_or_insert(e);
                    if abort {
                        warn!(source = %source.name(), "endpoint unavailable, skipping remaining batches");
                        break;
                    }
                }
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Drops recorded identities, duplicates within the fetch, and items
    /// older than the source's age cutoff.
    fn filter_new(
        &self,
        source: &Source,
        store: &RecordStore,
        items: Vec<Item>,
        stats: &mut SourceStats,
    ) -> Vec<Item> {
        let cutoff = age_cutoff(self.clock.now(), source.max_item_age);
        let mut seen = HashSet::new();
        let mut fresh = Vec::new();

        for item in items {
            if store.exists(&item.identity) || !seen.insert(item.identity.clone()) {
                continue;
            }
            if cutoff
                .zip(item.published_at)
                .is_some_and(|(cutoff, published)| published < cutoff)
            {
                debug!(source = %source.name(), identity = %item.identity, "skipping item past age cutoff");
                stats.too_old += 1;
                continue;
            }
            fresh.push(item);
        }
        fresh
    }

    async fn deliver_batch(
        &self,
        source: &Source,
        batch: &[Item],
        stats: &mut SourceStats,
    ) -> Result<BatchOutcome, CourierError> {
        let payloads = match source.transformer.transform(&source.descriptor, batch).await? {
            Summary::Empty => return Ok(BatchOutcome::Empty),
            Summary::Available(payloads) => payloads,
        };

        for payload in &payloads {
            self.channel.send(&source.endpoint, payload).await?;
            stats.delivered += 1;
        }
        Ok(BatchOutcome::Delivered)
    }
}

fn age_cutoff(now: Timestamp, max_age: Option<Duration>) -> Option<Timestamp> {
    let age = TimeDelta::from_std(max_age?).ok()?;
    now.checked_sub_signed(age)
}

async fn expire(deadline: Option<(Instant, Duration)>) -> Duration {
    match deadline {
        Some((at, duration)) => {
            tokio::time::sleep_until(at).await;
            duration
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn cutoff_is_now_minus_age() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        assert_eq!(
            age_cutoff(now, Some(Duration::from_secs(2 * 24 * 3600))),
            Some(Utc.with_ymd_and_hms(2026, 1, 13, 9, 0, 0).unwrap())
        );
        assert_eq!(age_cutoff(now, None), None);
    }

    #[tokio::test(start_paused = true)]
    async fn expire_fires_at_deadline() {
        let started = Instant::now();
        let d = expire(Some((started + Duration::from_secs(5), Duration::from_secs(5)))).await;
        assert_eq!(d, Duration::from_secs(5));
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
