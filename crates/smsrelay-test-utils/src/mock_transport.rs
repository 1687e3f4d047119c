// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock device transport for deterministic testing.
//!
//! `MockTransport` implements `DeviceTransport` with captured sends and
//! scriptable accept/reject/unavailable behavior for assertions in tests.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use smsrelay_core::{DeviceTransport, RelayError, SendAcceptance};

/// A mock device transport for testing.
///
/// Every call to `send_text` is captured as a `(phone, body)` pair,
/// retrievable via `sent_messages()`. By default every send is accepted;
/// individual numbers can be scripted to be rejected, and the whole
/// transport can be flipped to "unavailable" to exercise error paths.
pub struct MockTransport {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    reject_numbers: Arc<Mutex<HashSet<String>>>,
    unavailable: Arc<AtomicBool>,
}

impl MockTransport {
    /// Create a new mock transport that accepts everything.
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            reject_numbers: Arc::new(Mutex::new(HashSet::new())),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Script a phone number to be rejected (still captured).
    pub async fn reject_number(&self, phone: impl Into<String>) {
        self.reject_numbers.lock().await.insert(phone.into());
    }

    /// Flip the transport's availability. While unavailable, `send_text`
    /// returns a transport error and captures nothing.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// All `(phone, body)` pairs handed to `send_text`, in call order.
    pub async fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }

    /// The count of captured sends.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all captured sends.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceTransport for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    async fn send_text(&self, phone: &str, body: &str) -> Result<SendAcceptance, RelayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RelayError::Transport {
                message: "mock transport is unavailable".into(),
                source: None,
            });
        }

        self.sent
            .lock()
            .await
            .push((phone.to_string(), body.to_string()));

        if self.reject_numbers.lock().await.contains(phone) {
            Ok(SendAcceptance::Rejected)
        } else {
            Ok(SendAcceptance::Accepted)
        }
    }
}
