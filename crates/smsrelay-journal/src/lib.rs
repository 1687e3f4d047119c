// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable dispatch journal for the SMS relay.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. The journal holds
//! the crash-surviving dispatched-but-unacknowledged record that prevents
//! the outbound dispatcher from handing a message to the device transport
//! twice across job retries.

pub mod database;
pub mod migrations;
pub mod queries;

pub use database::Database;
