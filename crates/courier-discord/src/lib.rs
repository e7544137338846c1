// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord webhook delivery channel for the Courier notification relay.
//!
//! [`WebhookChannel`] implements [`courier_core::DeliveryChannel`]. It turns a
//! [`courier_core::DeliveryPayload`] into the webhook JSON body and posts it
//! through the shared retrying executor. It also honors the endpoint's
//! rate-limit headers before the next send to the same URL.

pub mod channel;
pub mod cooldown;
pub mod wire;

pub use channel::WebhookChannel;
pub use wire::{MAX_CONTENT_CHARS, MAX_DESCRIPTION_CHARS, chunk_text, truncate_chars};
