// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for SMS relay integration tests.
//!
//! Provides a mock device transport for fast, deterministic, CI-runnable
//! tests without a real telephony stack.

pub mod mock_transport;

pub use mock_transport::MockTransport;
