// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery channel trait for outbound notification endpoints.

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::types::DeliveryPayload;

/// Sends payloads to an outbound endpoint (e.g. a webhook URL).
///
/// Implementations own any throttling state for the endpoint; callers may
/// share one instance across every source.
#[async_trait]
pub trait DeliveryChannel: Send + Sync + 'static {
    async fn send(&self, endpoint: &str, payload: &DeliveryPayload) -> Result<(), DeliveryError>;
}
