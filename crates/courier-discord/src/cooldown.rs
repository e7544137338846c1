// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-endpoint rate-limit cooldowns.
//!
//! Each webhook URL owns one slot. A send holds its slot's lock from the
//! cooldown wait until the response headers are inspected, so two sends to
//! the same endpoint never overlap and the second always observes the
//! cooldown armed by the first.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Cooldown state of one endpoint.
#[derive(Debug, Default)]
pub struct CooldownState {
    expires_at: Option<Instant>,
}

impl CooldownState {
    /// Sleeps until any armed cooldown has elapsed, then clears it.
    ///
    /// The cooldown stays armed until the sleep completes, so a wait that is
    /// cancelled part-way leaves it in force for the next sender.
    pub async fn wait(&mut self) {
        let Some(deadline) = self.expires_at else {
            return;
        };
        let now = Instant::now();
        if deadline > now {
            debug!(
                wait_ms = (deadline - now).as_millis() as u64,
                "waiting out rate-limit cooldown"
            );
            tokio::time::sleep_until(deadline).await;
        }
        self.expires_at = None;
    }

    /// Blocks the next send for `duration` from now.
    pub fn arm(&mut self, duration: Duration) {
        self.expires_at = Some(Instant::now() + duration);
    }

    pub fn is_armed(&self) -> bool {
        self.expires_at.is_some_and(|deadline| deadline > Instant::now())
    }
}

/// Shared slot for one endpoint.
pub type CooldownSlot = Arc<tokio::sync::Mutex<CooldownState>>;

/// Lazily created cooldown slots keyed by endpoint URL.
#[derive(Default)]
pub struct CooldownRegistry {
    slots: Mutex<HashMap<String, CooldownSlot>>,
}

// Endpoint URLs embed webhook tokens, so only the slot count is shown.
impl std::fmt::Debug for CooldownRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let endpoints = self.slots.lock().map(|s| s.len()).unwrap_or_default();
        f.debug_struct("CooldownRegistry")
            .field("endpoints", &endpoints)
            .finish()
    }
}

impl CooldownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for `endpoint`, creating it on first use.
    pub fn slot(&self, endpoint: &str) -> CooldownSlot {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.entry(endpoint.to_string()).or_default().clone()
    }
}
