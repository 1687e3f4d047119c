// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as a well-formed backend URL and sane retry parameters.

use crate::diagnostic::ConfigError;
use crate::model::RelayConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.backend.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "backend.base_url must not be empty".to_string(),
        });
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(ConfigError::Validation {
            message: format!("backend.base_url `{base_url}` must start with http:// or https://"),
        });
    }

    if config.backend.batch_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "backend.batch_limit must be at least 1".to_string(),
        });
    }

    if config.backend.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "backend.request_timeout_secs must be non-zero".to_string(),
        });
    }

    if config.sync.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "sync.poll_interval_secs must be non-zero".to_string(),
        });
    }

    if config.sync.retry_multiplier < 1.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "sync.retry_multiplier must be at least 1.0, got {}",
                config.sync.retry_multiplier
            ),
        });
    }

    if let Some(max) = config.sync.max_attempts
        && max == 0
    {
        errors.push(ConfigError::Validation {
            message: "sync.max_attempts must be at least 1 when set".to_string(),
        });
    }

    if config.journal.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "journal.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
