// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound dispatcher: fetch pending messages, hand them to the device
//! transport, acknowledge the dispatched ids.
//!
//! The whole cycle is built around one ordering rule: a message id is
//! journaled BEFORE its send, and acknowledged to the backend before the
//! journal row is flipped. A crash at any point leaves the journal strictly
//! ahead of the backend's view, so the resume path can always reconcile by
//! acknowledging leftovers without ever touching the transport again. A
//! message is sent at most once per id, no matter how many times the
//! scheduler re-invokes the cycle.

use std::sync::Arc;

use metrics::counter;
use smsrelay_backend::BackendClient;
use smsrelay_config::ConfigHandle;
use smsrelay_core::{DeviceTransport, RelayError, SendAcceptance, SyncDirection};
use smsrelay_journal::{Database, queries};
use tracing::{debug, info, warn};

use crate::attempt::{SyncAttempt, SyncPhase};

/// Acknowledged journal rows kept as history when pruning.
const ACKED_HISTORY_KEEP: u32 = 1000;

/// What one dispatch cycle did, for logging and assertions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Leftover ids acknowledged before fetching (resume after a failed
    /// acknowledge in an earlier attempt).
    pub resumed_acks: usize,
    /// Messages returned by the fetch.
    pub fetched: usize,
    /// Messages actually handed to the transport this cycle.
    pub dispatched: usize,
    /// Messages skipped because their id was already journaled.
    pub skipped: usize,
    /// Sends the transport took but refused to queue.
    pub rejected: usize,
    /// Ids reported to mark-sent in the main acknowledge step.
    pub acknowledged: usize,
}

/// Runs the periodic outbound dispatch cycle.
pub struct OutboundDispatcher {
    config: ConfigHandle,
    journal: Database,
    transport: Arc<dyn DeviceTransport>,
}

impl OutboundDispatcher {
    pub fn new(config: ConfigHandle, journal: Database, transport: Arc<dyn DeviceTransport>) -> Self {
        Self {
            config,
            journal,
            transport,
        }
    }

    /// Run one dispatch cycle.
    ///
    /// Any error propagates with its retry classification after the phase
    /// bookkeeping records the outcome; the caller's scheduler decides
    /// whether and when to re-invoke.
    pub async fn run(&self, attempt_no: u32) -> Result<DispatchSummary, RelayError> {
        let mut attempt = SyncAttempt::new(SyncDirection::Outbound, attempt_no);

        match self.cycle(&mut attempt).await {
            Ok(summary) => {
                info!(
                    attempt = attempt.attempt(),
                    resumed_acks = summary.resumed_acks,
                    fetched = summary.fetched,
                    dispatched = summary.dispatched,
                    skipped = summary.skipped,
                    rejected = summary.rejected,
                    acknowledged = summary.acknowledged,
                    "outbound cycle complete"
                );
                Ok(summary)
            }
            Err(e) => {
                let phase = if e.is_retryable() {
                    counter!("smsrelay_sync_retries_total", "direction" => "outbound").increment(1);
                    SyncPhase::RetryScheduled
                } else {
                    SyncPhase::Abandoned
                };
                attempt.advance(phase)?;
                warn!(
                    attempt = attempt.attempt(),
                    error = %e,
                    retryable = e.is_retryable(),
                    "outbound cycle failed"
                );
                Err(e)
            }
        }
    }

    async fn cycle(&self, attempt: &mut SyncAttempt) -> Result<DispatchSummary, RelayError> {
        let mut summary = DispatchSummary::default();

        let config = self.config.snapshot();
        let client = BackendClient::from_config(&config.backend)?;

        // Resume: leftovers mean an earlier attempt crashed or lost the
        // acknowledge. Those messages were (as far as we can know) already
        // sent, so they are acknowledged first and never re-dispatched.
        let leftovers = queries::unacknowledged(&self.journal).await?;
        if !leftovers.is_empty() {
            attempt.advance(SyncPhase::Acknowledging)?;
            info!(
                count = leftovers.len(),
                "resuming: acknowledging previously dispatched ids"
            );
            client.mark_sent(&leftovers).await?;
            queries::mark_acknowledged(&self.journal, &leftovers).await?;
            counter!("smsrelay_outbound_acked_total").increment(leftovers.len() as u64);
            summary.resumed_acks = leftovers.len();
        }

        attempt.advance(SyncPhase::Fetching)?;
        let batch = client.fetch_outbound(config.backend.batch_limit).await?;
        summary.fetched = batch.len();
        if batch.is_empty() {
            debug!("no pending outbound messages");
            attempt.advance(SyncPhase::Done)?;
            return Ok(summary);
        }

        attempt.advance(SyncPhase::Dispatching)?;
        for message in &batch {
            // The insert is the claim. Losing it means this id was already
            // handed to the transport by this or an earlier invocation, and
            // a fetch that still returns it just means its acknowledge has
            // not landed yet.
            if !queries::record_dispatched(&self.journal, message.id, &message.phone).await? {
                debug!(id = message.id, "already journaled, skipping send");
                summary.skipped += 1;
                continue;
            }

            match self.transport.send_text(&message.phone, &message.body).await {
                Ok(SendAcceptance::Accepted) => {
                    debug!(id = message.id, phone = %message.phone, "message dispatched");
                    summary.dispatched += 1;
                }
                Ok(SendAcceptance::Rejected) => {
                    // The transport took the message and refused it; there
                    // is no signal a retry would fare better, so the id is
                    // acknowledged like any other to keep the backend from
                    // re-serving it forever.
                    warn!(id = message.id, phone = %message.phone, "transport rejected message");
                    summary.dispatched += 1;
                    summary.rejected += 1;
                }
                Err(e) => {
                    // A clean transport error means the send did not happen,
                    // so the claim is safe to withdraw; the backend keeps the
                    // message pending and a later cycle picks it up.
                    queries::remove_dispatched(&self.journal, message.id).await?;
                    warn!(id = message.id, error = %e, "transport send failed, claim withdrawn");
                    return Err(e);
                }
            }
        }
        counter!("smsrelay_outbound_dispatched_total").increment(summary.dispatched as u64);

        attempt.advance(SyncPhase::Acknowledging)?;
        // Re-read rather than trusting the in-memory batch: a concurrent
        // invocation may have claimed some of these ids.
        let to_ack = queries::unacknowledged(&self.journal).await?;
        if !to_ack.is_empty() {
            client.mark_sent(&to_ack).await?;
            queries::mark_acknowledged(&self.journal, &to_ack).await?;
            counter!("smsrelay_outbound_acked_total").increment(to_ack.len() as u64);
        }
        summary.acknowledged = to_ack.len();

        let pruned = queries::prune_acknowledged(&self.journal, ACKED_HISTORY_KEEP).await?;
        if pruned > 0 {
            debug!(pruned, "pruned acknowledged journal history");
        }

        attempt.advance(SyncPhase::Done)?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smsrelay_config::RelayConfig;
    use smsrelay_config::model::JournalConfig;
    use smsrelay_test_utils::MockTransport;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(server: &MockServer) -> (OutboundDispatcher, Arc<MockTransport>, TempDir) {
        let dir = TempDir::new().unwrap();
        let journal_config = JournalConfig {
            database_path: dir.path().join("journal.db").to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let journal = Database::open(&journal_config).await.unwrap();

        let mut config = RelayConfig::default();
        config.backend.base_url = server.uri();
        config.backend.request_timeout_secs = 1;

        let transport = Arc::new(MockTransport::new());
        let dispatcher = OutboundDispatcher::new(
            ConfigHandle::new(config),
            journal,
            transport.clone() as Arc<dyn DeviceTransport>,
        );
        (dispatcher, transport, dir)
    }

    fn fetch_returning(body: serde_json::Value) -> Mock {
        Mock::given(method("GET"))
            .and(path("/gateway/outbound"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
    }

    #[tokio::test]
    async fn empty_batch_is_a_clean_noop() {
        let server = MockServer::start().await;
        fetch_returning(serde_json::json!([]))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/gateway/mark-sent"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (dispatcher, transport, _dir) = setup(&server).await;
        let summary = dispatcher.run(1).await.unwrap();

        assert_eq!(summary, DispatchSummary::default());
        assert_eq!(transport.sent_count().await, 0);
    }

    #[tokio::test]
    async fn rejected_send_is_still_acknowledged() {
        let server = MockServer::start().await;
        fetch_returning(serde_json::json!([
            {"id": 1, "phone": "+1555", "body": "ok"},
            {"id": 2, "phone": "+1666", "body": "refused"}
        ]))
        .mount(&server)
        .await;
        Mock::given(method("POST"))
            .and(path("/gateway/mark-sent"))
            .and(body_json(serde_json::json!([1, 2])))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (dispatcher, transport, _dir) = setup(&server).await;
        transport.reject_number("+1666").await;

        let summary = dispatcher.run(1).await.unwrap();
        assert_eq!(summary.dispatched, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.acknowledged, 2);
    }

    #[tokio::test]
    async fn transport_failure_withdraws_claim_and_reports_retry() {
        let server = MockServer::start().await;
        fetch_returning(serde_json::json!([{"id": 7, "phone": "+1555", "body": "hi"}]))
        .mount(&server)
        .await;

        let (dispatcher, transport, _dir) = setup(&server).await;
        transport.set_unavailable(true);

        let err = dispatcher.run(1).await.unwrap_err();
        assert!(err.is_retryable());

        // Claim withdrawn: the next cycle re-fetches and re-sends id 7.
        Mock::given(method("POST"))
            .and(path("/gateway/mark-sent"))
            .and(body_json(serde_json::json!([7])))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        transport.set_unavailable(false);

        let summary = dispatcher.run(2).await.unwrap();
        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(transport.sent_count().await, 1);
    }

    #[tokio::test]
    async fn malformed_fetch_body_abandons_without_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gateway/outbound"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{broken"))
            .mount(&server)
            .await;

        let (dispatcher, transport, _dir) = setup(&server).await;
        let err = dispatcher.run(1).await.unwrap_err();

        assert!(matches!(err, RelayError::Malformed(_)));
        assert!(!err.is_retryable());
        assert_eq!(transport.sent_count().await, 0);
    }
}
