// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job scheduler for the sync pipelines.
//!
//! Owns the retry policy the pipelines themselves deliberately do not have:
//! periodic outbound polls, per-event inbound triggers, and exponential
//! backoff re-invocation of attempts that failed transiently. Permanent
//! failures are not retried; the outbound pipeline gets a fresh start at
//! the next poll regardless.

use std::sync::Arc;
use std::time::Duration;

use smsrelay_config::ConfigHandle;
use smsrelay_config::model::SyncConfig;
use smsrelay_sync::{InboundEvent, InboundRelay, OutboundDispatcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Delay before re-invoking a transiently failed attempt.
///
/// `attempt` is the 1-based number of the attempt that just failed: the
/// first retry waits the base delay, each further retry multiplies it. The
/// delay never exceeds the poll interval -- beyond that, waiting for the
/// next regular poll would be faster anyway.
fn retry_delay(sync: &SyncConfig, attempt: u32) -> Duration {
    let base = sync.retry_base_delay().as_secs_f64();
    let factor = sync.retry_multiplier.powi(attempt.saturating_sub(1) as i32);
    let cap = sync.poll_interval().as_secs_f64();
    Duration::from_secs_f64((base * factor).min(cap))
}

/// True when the retry budget allows another attempt after `attempt` failed.
fn may_retry(sync: &SyncConfig, attempt: u32) -> bool {
    match sync.max_attempts {
        Some(max) => attempt < max,
        None => true,
    }
}

/// Drives both pipelines until shutdown.
pub struct SyncScheduler {
    config: ConfigHandle,
    dispatcher: Arc<OutboundDispatcher>,
    relay: Arc<InboundRelay>,
}

impl SyncScheduler {
    pub fn new(config: ConfigHandle, dispatcher: OutboundDispatcher, relay: InboundRelay) -> Self {
        Self {
            config,
            dispatcher: Arc::new(dispatcher),
            relay: Arc::new(relay),
        }
    }

    /// Main scheduler loop.
    ///
    /// Runs an outbound cycle immediately on startup, then every poll
    /// interval. Inbound events arriving on `inbound_rx` are handled
    /// concurrently, each with its own retry lifecycle. Returns when
    /// `shutdown` fires; an in-flight attempt finishes its current step,
    /// retry waits are interrupted.
    pub async fn run(
        &self,
        mut inbound_rx: mpsc::Receiver<InboundEvent>,
        shutdown: CancellationToken,
    ) {
        let mut inbound_closed = false;

        loop {
            if shutdown.is_cancelled() {
                return;
            }

            self.outbound_with_retry(&shutdown).await;

            let poll = self.config.snapshot().sync.poll_interval();
            debug!(secs = poll.as_secs(), "next outbound poll scheduled");
            let sleep = tokio::time::sleep(poll);
            tokio::pin!(sleep);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = &mut sleep => break,
                    maybe = inbound_rx.recv(), if !inbound_closed => match maybe {
                        Some(event) => self.spawn_inbound(event, shutdown.clone()),
                        None => inbound_closed = true,
                    },
                }
            }
        }
    }

    /// One outbound cycle, re-invoked with backoff while failures stay
    /// transient and the retry budget lasts.
    async fn outbound_with_retry(&self, shutdown: &CancellationToken) {
        let mut attempt = 1u32;
        loop {
            match self.dispatcher.run(attempt).await {
                Ok(_) => return,
                Err(e) if !e.is_retryable() => {
                    warn!(attempt, error = %e, "outbound cycle abandoned until next poll");
                    return;
                }
                Err(e) => {
                    let sync = self.config.snapshot().sync.clone();
                    if !may_retry(&sync, attempt) {
                        warn!(attempt, error = %e, "outbound retry budget exhausted");
                        return;
                    }
                    let delay = retry_delay(&sync, attempt);
                    debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying outbound cycle");
                    tokio::select! {
                        _ = shutdown.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Handle one inbound event in its own task so a slow or retrying
    /// forward never delays the outbound poll cadence.
    fn spawn_inbound(&self, event: InboundEvent, shutdown: CancellationToken) {
        let relay = self.relay.clone();
        let config = self.config.clone();
        tokio::spawn(async move {
            let mut attempt = 1u32;
            loop {
                match relay.run(event.clone(), attempt).await {
                    Ok(()) => return,
                    Err(e) if !e.is_retryable() => {
                        warn!(attempt, error = %e, "inbound forward abandoned");
                        return;
                    }
                    Err(e) => {
                        let sync = config.snapshot().sync.clone();
                        if !may_retry(&sync, attempt) {
                            warn!(attempt, error = %e, "inbound retry budget exhausted, message lost");
                            return;
                        }
                        let delay = retry_delay(&sync, attempt);
                        info!(attempt, delay_ms = delay.as_millis() as u64, "retrying inbound forward");
                        tokio::select! {
                            _ = shutdown.cancelled() => return,
                            _ = tokio::time::sleep(delay) => {}
                        }
                        attempt += 1;
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smsrelay_config::RelayConfig;
    use smsrelay_config::model::JournalConfig;
    use smsrelay_core::DeviceTransport;
    use smsrelay_journal::Database;
    use smsrelay_test_utils::MockTransport;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sync_config(base: u64, multiplier: f64, poll: u64) -> SyncConfig {
        SyncConfig {
            poll_interval_secs: poll,
            retry_base_delay_secs: base,
            retry_multiplier: multiplier,
            max_attempts: None,
        }
    }

    #[test]
    fn retry_delay_grows_exponentially() {
        let sync = sync_config(2, 2.0, 900);
        assert_eq!(retry_delay(&sync, 1), Duration::from_secs(2));
        assert_eq!(retry_delay(&sync, 2), Duration::from_secs(4));
        assert_eq!(retry_delay(&sync, 3), Duration::from_secs(8));
        assert_eq!(retry_delay(&sync, 4), Duration::from_secs(16));
    }

    #[test]
    fn retry_delay_is_capped_at_poll_interval() {
        let sync = sync_config(2, 2.0, 60);
        assert_eq!(retry_delay(&sync, 6), Duration::from_secs(60));
        assert_eq!(retry_delay(&sync, 30), Duration::from_secs(60));
    }

    #[test]
    fn flat_multiplier_keeps_base_delay() {
        let sync = sync_config(5, 1.0, 900);
        assert_eq!(retry_delay(&sync, 1), Duration::from_secs(5));
        assert_eq!(retry_delay(&sync, 7), Duration::from_secs(5));
    }

    #[test]
    fn retry_budget_counts_attempts() {
        let mut sync = sync_config(2, 2.0, 900);
        assert!(may_retry(&sync, 1));
        assert!(may_retry(&sync, 1_000_000));

        sync.max_attempts = Some(3);
        assert!(may_retry(&sync, 1));
        assert!(may_retry(&sync, 2));
        assert!(!may_retry(&sync, 3));
    }

    async fn scheduler_for(server: &MockServer, max_attempts: Option<u32>) -> (SyncScheduler, Arc<MockTransport>, TempDir) {
        let dir = TempDir::new().unwrap();
        let journal_config = JournalConfig {
            database_path: dir.path().join("journal.db").to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let journal = Database::open(&journal_config).await.unwrap();

        let mut config = RelayConfig::default();
        config.backend.base_url = server.uri();
        config.backend.request_timeout_secs = 1;
        config.sync.retry_base_delay_secs = 0;
        config.sync.max_attempts = max_attempts;
        let handle = ConfigHandle::new(config);

        let transport = Arc::new(MockTransport::new());
        let dispatcher = OutboundDispatcher::new(
            handle.clone(),
            journal,
            transport.clone() as Arc<dyn DeviceTransport>,
        );
        let relay = InboundRelay::new(handle.clone());
        (SyncScheduler::new(handle, dispatcher, relay), transport, dir)
    }

    #[tokio::test]
    async fn outbound_retries_until_transient_failure_clears() {
        let server = MockServer::start().await;
        // Two failures, then an empty batch.
        Mock::given(method("GET"))
            .and(path("/gateway/outbound"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gateway/outbound"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let (scheduler, _transport, _dir) = scheduler_for(&server, None).await;
        let shutdown = CancellationToken::new();
        scheduler.outbound_with_retry(&shutdown).await;
    }

    #[tokio::test]
    async fn outbound_stops_at_retry_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gateway/outbound"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let (scheduler, _transport, _dir) = scheduler_for(&server, Some(2)).await;
        let shutdown = CancellationToken::new();
        // Returns after exactly two attempts; the mock's expectation
        // verifies no third request was made.
        scheduler.outbound_with_retry(&shutdown).await;
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gateway/outbound"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let (scheduler, _transport, _dir) = scheduler_for(&server, None).await;
        let shutdown = CancellationToken::new();
        scheduler.outbound_with_retry(&shutdown).await;
    }

    #[tokio::test]
    async fn shutdown_interrupts_retry_wait() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gateway/outbound"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (scheduler, _transport, _dir) = scheduler_for(&server, None).await;
        // Long base delay so the loop parks in the retry wait.
        scheduler.config.update({
            let mut c = (*scheduler.config.snapshot()).clone();
            c.backend.base_url = server.uri();
            c.sync.retry_base_delay_secs = 3600;
            c
        });

        let shutdown = CancellationToken::new();
        let canceller = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        tokio::time::timeout(Duration::from_secs(5), scheduler.outbound_with_retry(&shutdown))
            .await
            .expect("shutdown must interrupt the retry wait");
    }
}
