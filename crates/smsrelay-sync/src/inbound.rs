// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound relay: forward one captured message to the backend.
//!
//! One invocation per device message event. The relay issues exactly one
//! forward request; retry on transient failure is the job scheduler's
//! business (the triggering event is redelivered at-least-once), so the
//! whole step must be re-derivable from its inputs -- and it is: no local
//! state, no local dedup. The backend owns deduplication of identical
//! `(address, body)` pairs within an arrival window if it needs it.

use metrics::counter;
use smsrelay_backend::BackendClient;
use smsrelay_config::ConfigHandle;
use smsrelay_core::{InboundSms, RelayError, SyncDirection};
use tracing::{debug, info, warn};

use crate::attempt::{SyncAttempt, SyncPhase};

/// The raw trigger payload, before validation. Fields may be absent when
/// the OS event was malformed or the scheduler redelivered a stripped
/// payload.
#[derive(Debug, Clone, Default)]
pub struct InboundEvent {
    pub from: Option<String>,
    pub body: Option<String>,
}

impl InboundEvent {
    pub fn new(from: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            body: Some(body.into()),
        }
    }
}

/// Forwards device-received messages to the backend's inbound endpoint.
pub struct InboundRelay {
    config: ConfigHandle,
}

impl InboundRelay {
    pub fn new(config: ConfigHandle) -> Self {
        Self { config }
    }

    /// Run one relay attempt for one triggering event.
    ///
    /// - Unusable payload (no originating address) -> successful no-op:
    ///   there is nothing to forward and retrying would not change that.
    /// - Absent body with a present address -> forwarded with an empty
    ///   body; an empty message is a valid message.
    /// - Any transport error or non-2xx -> the error propagates with its
    ///   retry classification; this method never loops locally.
    pub async fn run(&self, event: InboundEvent, attempt_no: u32) -> Result<(), RelayError> {
        let mut attempt = SyncAttempt::new(SyncDirection::Inbound, attempt_no);

        let Some(from) = event.from else {
            if event.body.is_some() {
                warn!("inbound event carries a body but no originating address, dropping");
            } else {
                debug!("inbound event with no usable fields, nothing to forward");
            }
            attempt.advance(SyncPhase::Done)?;
            return Ok(());
        };

        let sms = InboundSms {
            from,
            body: event.body.unwrap_or_default(),
        };

        // Snapshot the config once, at attempt start; a concurrent settings
        // edit applies from the next attempt on.
        let config = self.config.snapshot();
        let client = BackendClient::from_config(&config.backend)?;

        attempt.advance(SyncPhase::Forwarding)?;
        match client.forward_inbound(&sms).await {
            Ok(()) => {
                attempt.advance(SyncPhase::Done)?;
                counter!("smsrelay_inbound_forwarded_total").increment(1);
                info!(from = %sms.from, attempt = attempt.attempt(), "inbound message forwarded");
                Ok(())
            }
            Err(e) => {
                let phase = if e.is_retryable() {
                    counter!("smsrelay_sync_retries_total", "direction" => "inbound").increment(1);
                    SyncPhase::RetryScheduled
                } else {
                    SyncPhase::Abandoned
                };
                attempt.advance(phase)?;
                warn!(from = %sms.from, error = %e, retryable = e.is_retryable(), "inbound forward failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smsrelay_config::RelayConfig;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handle_for(server: &MockServer) -> ConfigHandle {
        let mut config = RelayConfig::default();
        config.backend.base_url = server.uri();
        config.backend.request_timeout_secs = 1;
        ConfigHandle::new(config)
    }

    #[tokio::test]
    async fn forwards_exactly_one_request_per_invocation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/receive-sms"))
            .and(body_json(serde_json::json!({
                "from": "+15550001111",
                "message": "hello"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let relay = InboundRelay::new(handle_for(&server));
        relay
            .run(InboundEvent::new("+15550001111", "hello"), 1)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_body_is_forwarded_as_empty_message() {
        // Scenario: from="+1555", body="" -> exactly one forward with message:"".
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/receive-sms"))
            .and(body_json(serde_json::json!({
                "from": "+1555",
                "message": ""
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let relay = InboundRelay::new(handle_for(&server));
        relay.run(InboundEvent::new("+1555", ""), 1).await.unwrap();
    }

    #[tokio::test]
    async fn absent_body_with_address_is_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/receive-sms"))
            .and(body_json(serde_json::json!({
                "from": "+1555",
                "message": ""
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let relay = InboundRelay::new(handle_for(&server));
        let event = InboundEvent {
            from: Some("+1555".into()),
            body: None,
        };
        relay.run(event, 1).await.unwrap();
    }

    #[tokio::test]
    async fn unusable_payload_is_a_successful_noop() {
        let server = MockServer::start().await;
        // No mock mounted: any request would 404 and fail the test below.
        Mock::given(method("POST"))
            .and(path("/receive-sms"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let relay = InboundRelay::new(handle_for(&server));
        relay.run(InboundEvent::default(), 1).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_response_reports_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/receive-sms"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let relay = InboundRelay::new(handle_for(&server));
        let err = relay
            .run(InboundEvent::new("+1555", "hi"), 1)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn config_snapshot_is_taken_per_invocation() {
        let stale = MockServer::start().await;
        let fresh = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/receive-sms"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&stale)
            .await;
        Mock::given(method("POST"))
            .and(path("/receive-sms"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&fresh)
            .await;

        let handle = handle_for(&stale);
        let relay = InboundRelay::new(handle.clone());

        // Settings edit between invocations: the next attempt must use it.
        handle.set_base_url(fresh.uri());
        relay
            .run(InboundEvent::new("+1555", "hi"), 1)
            .await
            .unwrap();
    }
}
