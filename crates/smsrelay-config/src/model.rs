// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the SMS relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level relay configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Relay identity and logging settings.
    #[serde(default)]
    pub relay: RelaySection,

    /// Backend endpoint settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Sync scheduling and retry settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Dispatch journal storage settings.
    #[serde(default)]
    pub journal: JournalConfig,
}

/// Relay identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelaySection {
    /// Display name of this relay instance.
    #[serde(default = "default_relay_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            name: default_relay_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_relay_name() -> String {
    "smsrelay".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Backend endpoint configuration.
///
/// The base URL is the user-editable setting; the settings surface may
/// update it at any time, and each sync attempt snapshots the value it
/// starts with (see [`crate::handle::ConfigHandle`]).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the backend service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds. A hung network call must not starve
    /// the scheduler's retry budget.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum number of outbound messages fetched per dispatch cycle.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: u32,
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            batch_limit: default_batch_limit(),
        }
    }
}

fn default_base_url() -> String {
    "http://192.168.1.100:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_batch_limit() -> u32 {
    20
}

/// Sync scheduling and retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Interval between periodic outbound polls, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Base delay for the first retry of a failed attempt, in seconds.
    #[serde(default = "default_retry_base_delay_secs")]
    pub retry_base_delay_secs: u64,

    /// Exponential backoff multiplier between retries.
    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,

    /// Maximum retry attempts per triggering event. `None` retries
    /// indefinitely, with the backoff delay capped at the poll interval.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_secs(self.retry_base_delay_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            retry_base_delay_secs: default_retry_base_delay_secs(),
            retry_multiplier: default_retry_multiplier(),
            max_attempts: None,
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    900
}

fn default_retry_base_delay_secs() -> u64 {
    2
}

fn default_retry_multiplier() -> f64 {
    2.0
}

/// Dispatch journal storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JournalConfig {
    /// Path to the SQLite journal file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("smsrelay").join("journal.db"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "smsrelay-journal.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RelayConfig::default();
        assert_eq!(config.relay.name, "smsrelay");
        assert_eq!(config.relay.log_level, "info");
        assert_eq!(config.backend.base_url, "http://192.168.1.100:8000");
        assert_eq!(config.backend.batch_limit, 20);
        assert_eq!(config.sync.poll_interval_secs, 900);
        assert_eq!(config.sync.max_attempts, None);
        assert!(config.journal.wal_mode);
    }

    #[test]
    fn duration_helpers_convert_seconds() {
        let config = RelayConfig::default();
        assert_eq!(config.backend.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.sync.poll_interval(), Duration::from_secs(900));
        assert_eq!(config.sync.retry_base_delay(), Duration::from_secs(2));
    }
}
