// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device transport trait for the OS messaging primitive.

use async_trait::async_trait;

use crate::error::RelayError;
use crate::types::SendAcceptance;

/// Adapter for the device's raw message-send primitive.
///
/// Implementations wrap whatever the host platform offers (an OS telephony
/// API, a modem, a simulator). The contract is accept-for-sending only:
/// a returned [`SendAcceptance::Accepted`] does not mean the message was
/// delivered, and the dispatcher does not treat `Rejected` as a reason to
/// withhold acknowledgement -- retirement is gated on the dispatch attempt,
/// not on delivery.
#[async_trait]
pub trait DeviceTransport: Send + Sync + 'static {
    /// Human-readable name of this transport, used in logs.
    fn name(&self) -> &str;

    /// Hands one message to the device for sending.
    ///
    /// Errors are reserved for transport-level failures (the primitive
    /// itself is unavailable); an unwilling-but-functioning device returns
    /// `Ok(SendAcceptance::Rejected)`.
    async fn send_text(&self, phone: &str, body: &str) -> Result<SendAcceptance, RelayError>;
}
