// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the SMS relay.
//!
//! This crate provides the error type, the shared data model, and the
//! adapter trait for the device transport boundary. The sync pipelines,
//! backend client, and dispatch journal all build on these definitions.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RelayError;
pub use traits::DeviceTransport;
pub use types::{InboundSms, OutboundSms, SendAcceptance, SyncDirection};
