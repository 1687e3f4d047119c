// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the SMS relay.

use thiserror::Error;

/// The primary error type used across the relay pipelines and adapters.
///
/// Variants carry their retry classification: the pipelines never compute
/// backoff themselves, they report [`is_retryable`](RelayError::is_retryable)
/// to the invoking job scheduler, which owns retry timing.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Dispatch journal errors (database open, query failure, migration).
    #[error("journal error: {source}")]
    Journal {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport-level failures: network unreachable, connect refused, timeout.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend answered with a non-success HTTP status.
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// The backend answered 2xx but the body violates the wire contract.
    #[error("malformed backend response: {0}")]
    Malformed(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Whether the invoking job should be re-scheduled with backoff.
    ///
    /// Transient: transport failures, server-side errors (5xx, 429), and
    /// journal failures (local storage may recover). Permanent: config
    /// errors, client-side rejections, and contract violations -- retrying
    /// those churns forever against a broken counterpart.
    pub fn is_retryable(&self) -> bool {
        match self {
            RelayError::Transport { .. } => true,
            RelayError::Journal { .. } => true,
            RelayError::Backend { status, .. } => *status == 429 || *status >= 500,
            RelayError::Config(_) | RelayError::Malformed(_) | RelayError::Internal(_) => false,
        }
    }
}
