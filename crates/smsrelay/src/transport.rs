// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log-only device transport.
//!
//! Stands in at the telephony boundary where a deployment would plug in a
//! modem or gateway integration. Every send is logged and accepted, which
//! makes the daemon usable end-to-end against a real backend for soak
//! testing without sending actual messages.

use async_trait::async_trait;
use smsrelay_core::{DeviceTransport, RelayError, SendAcceptance};
use tracing::info;

pub struct LogTransport;

impl LogTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceTransport for LogTransport {
    fn name(&self) -> &str {
        "log"
    }

    async fn send_text(&self, phone: &str, body: &str) -> Result<SendAcceptance, RelayError> {
        info!(phone = %phone, chars = body.len(), "would send message");
        Ok(SendAcceptance::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_every_send() {
        let transport = LogTransport::new();
        let acceptance = transport.send_text("+15550001111", "hello").await.unwrap();
        assert_eq!(acceptance, SendAcceptance::Accepted);
    }
}
