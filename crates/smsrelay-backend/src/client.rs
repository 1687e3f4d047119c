// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the backend's relay endpoints.
//!
//! Provides [`BackendClient`] which executes the three logical operations
//! (forward inbound, fetch outbound, mark sent) against the configured base
//! endpoint, with a bounded timeout and transient/permanent failure
//! classification. The client deliberately performs NO retries of its own:
//! retry timing belongs to the invoking job scheduler, the client only
//! classifies.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use smsrelay_config::model::BackendConfig;
use smsrelay_core::{InboundSms, OutboundSms, RelayError};
use tracing::debug;

/// HTTP client bound to one snapshot of the backend configuration.
///
/// Constructed fresh per sync attempt so that a base URL edited between
/// attempts takes effect on the next invocation, never mid-attempt.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Build a client from a backend configuration snapshot.
    pub fn from_config(config: &BackendConfig) -> Result<Self, RelayError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RelayError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL this client was built against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forward one captured inbound message: `POST {base}/receive-sms`.
    ///
    /// Success is any 2xx; the response body is not inspected.
    pub async fn forward_inbound(&self, sms: &InboundSms) -> Result<(), RelayError> {
        let url = format!("{}/receive-sms", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(sms)
            .send()
            .await
            .map_err(map_send_err)?;

        let status = response.status();
        debug!(status = %status, from = %sms.from, "inbound forward response");

        if status.is_success() {
            return Ok(());
        }
        Err(status_error(status, response).await)
    }

    /// Fetch up to `limit` pending outbound messages:
    /// `GET {base}/gateway/outbound?limit=N`.
    ///
    /// An empty array is a valid, terminal-success response. An undecodable
    /// body on a 2xx is a permanent failure -- retrying a persistently
    /// broken contract would churn forever.
    pub async fn fetch_outbound(&self, limit: u32) -> Result<Vec<OutboundSms>, RelayError> {
        let url = format!("{}/gateway/outbound?limit={limit}", self.base_url);
        let response = self.client.get(&url).send().await.map_err(map_send_err)?;

        let status = response.status();
        debug!(status = %status, limit, "outbound fetch response");

        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        let body = response.text().await.map_err(|e| RelayError::Transport {
            message: format!("failed to read fetch response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        serde_json::from_str(&body)
            .map_err(|e| RelayError::Malformed(format!("outbound fetch body: {e}")))
    }

    /// Report a batch of dispatched ids: `POST {base}/gateway/mark-sent`.
    ///
    /// The body is the JSON array of ids previously returned by fetch.
    pub async fn mark_sent(&self, ids: &[i64]) -> Result<(), RelayError> {
        let url = format!("{}/gateway/mark-sent", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ids)
            .send()
            .await
            .map_err(map_send_err)?;

        let status = response.status();
        debug!(status = %status, count = ids.len(), "mark-sent response");

        if status.is_success() {
            return Ok(());
        }
        Err(status_error(status, response).await)
    }
}

/// Map a reqwest send error into the transport classification (transient).
fn map_send_err(e: reqwest::Error) -> RelayError {
    let message = if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        format!("HTTP request failed: {e}")
    };
    RelayError::Transport {
        message,
        source: Some(Box::new(e)),
    }
}

/// Build a `Backend` error from a non-success response, draining the body
/// for the message. Retryability falls out of the status code.
async fn status_error(status: StatusCode, response: reqwest::Response) -> RelayError {
    let body = response.text().await.unwrap_or_default();
    RelayError::Backend {
        status: status.as_u16(),
        message: truncate(&body, 200),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
