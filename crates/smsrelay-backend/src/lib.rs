// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend HTTP client for the SMS relay.
//!
//! One logical operation per method, bounded timeout, no internal retry:
//! failures come back classified as transient or permanent and the job
//! scheduler decides what happens next.

pub mod client;

pub use client::BackendClient;
