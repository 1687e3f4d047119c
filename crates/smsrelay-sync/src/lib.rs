// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sync pipelines for the SMS relay.
//!
//! Two independent, unidirectional pipelines connect the device and the
//! backend:
//!
//! - [`InboundRelay`] forwards device-received messages to the backend,
//!   one invocation per message event.
//! - [`OutboundDispatcher`] runs the periodic fetch -> dispatch ->
//!   acknowledge cycle, journaling each id before its send so that retries
//!   never hand the same message to the transport twice.
//!
//! Neither pipeline retries internally. Both classify failures as transient
//! or permanent and leave retry timing to the invoking scheduler.

pub mod attempt;
pub mod inbound;
pub mod outbound;

pub use attempt::{SyncAttempt, SyncPhase};
pub use inbound::{InboundEvent, InboundRelay};
pub use outbound::{DispatchSummary, OutboundDispatcher};
