// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./smsrelay.toml` > `~/.config/smsrelay/smsrelay.toml`
//! > `/etc/smsrelay/smsrelay.toml` with environment variable overrides via
//! `SMSRELAY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RelayConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/smsrelay/smsrelay.toml` (system-wide)
/// 3. `~/.config/smsrelay/smsrelay.toml` (user XDG config)
/// 4. `./smsrelay.toml` (local directory)
/// 5. `SMSRELAY_*` environment variables
pub fn load_config() -> Result<RelayConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<RelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RelayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RelayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RelayConfig::default()))
        .merge(Toml::file("/etc/smsrelay/smsrelay.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("smsrelay/smsrelay.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("smsrelay.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `SMSRELAY_BACKEND_BASE_URL` must map to
/// `backend.base_url`, not `backend.base.url`.
fn env_provider() -> Env {
    Env::prefixed("SMSRELAY_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: SMSRELAY_BACKEND_BASE_URL -> "backend_base_url"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("relay_", "relay.", 1)
            .replacen("backend_", "backend.", 1)
            .replacen("sync_", "sync.", 1)
            .replacen("journal_", "journal.", 1);
        mapped.into()
    })
}
