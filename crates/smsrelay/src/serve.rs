// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `smsrelay serve` command implementation.
//!
//! Wires the pieces together: opens the dispatch journal, builds the
//! hot-swappable config handle, installs the log-only device transport,
//! and runs the scheduler until a shutdown signal arrives. Inbound events
//! are read from stdin as `from|body` lines.

use std::sync::Arc;

use smsrelay_config::ConfigHandle;
use smsrelay_config::model::RelayConfig;
use smsrelay_core::{DeviceTransport, RelayError};
use smsrelay_journal::Database;
use smsrelay_sync::{InboundRelay, OutboundDispatcher};
use tokio::sync::mpsc;
use tracing::info;

use crate::events::spawn_stdin_source;
use crate::scheduler::SyncScheduler;
use crate::shutdown::install_signal_handler;
use crate::transport::LogTransport;

/// Runs the `smsrelay serve` command.
pub async fn run_serve(config: RelayConfig) -> Result<(), RelayError> {
    init_tracing(&config.relay.log_level);

    info!(
        name = %config.relay.name,
        backend = %config.backend.base_url,
        "starting smsrelay serve"
    );

    let journal = Database::open(&config.journal).await?;
    let handle = ConfigHandle::new(config);

    let transport: Arc<dyn DeviceTransport> = Arc::new(LogTransport::new());
    info!(transport = transport.name(), "device transport ready");

    let dispatcher = OutboundDispatcher::new(handle.clone(), journal.clone(), transport);
    let relay = InboundRelay::new(handle.clone());

    let shutdown = install_signal_handler();
    let (inbound_tx, inbound_rx) = mpsc::channel(64);
    spawn_stdin_source(inbound_tx, shutdown.clone());

    let scheduler = SyncScheduler::new(handle, dispatcher, relay);
    scheduler.run(inbound_rx, shutdown).await;

    info!("scheduler stopped, closing journal");
    journal.close().await?;
    info!("shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber from the configured log level.
///
/// `RUST_LOG` overrides the config value when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    // Every workspace crate logs under an smsrelay* target.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "smsrelay={log_level},smsrelay_sync={log_level},smsrelay_journal={log_level},\
             smsrelay_backend={log_level},smsrelay_config={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
