// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. The `Database` struct IS the single writer: query functions accept
//! `&Database` and go through `connection().call()`. Do NOT create additional
//! `Connection` instances for writes -- the single-writer model is what makes
//! concurrent pipeline invocations safe without SQLITE_BUSY errors.

use std::path::Path;

use smsrelay_config::model::JournalConfig;
use smsrelay_core::RelayError;
use tracing::debug;

use crate::migrations;

/// Handle to the journal database.
///
/// Wraps a single `tokio_rusqlite::Connection`; cloning the inner connection
/// handle is cheap and all clones share the same background writer thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the journal database and run pending migrations.
    ///
    /// Applies WAL mode (when configured), NORMAL synchronous, and a busy
    /// timeout before migrations run.
    pub async fn open(config: &JournalConfig) -> Result<Self, RelayError> {
        if let Some(parent) = Path::new(&config.database_path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| RelayError::Journal {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(&config.database_path)
            .await
            .map_err(|e| map_tr_err(e.into()))?;

        let wal = config.wal_mode;
        conn.call(move |conn| {
            if wal {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            migrations::run_migrations(conn)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(e.to_string().into()))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path = %config.database_path, wal = wal, "journal database opened");
        Ok(Self { conn })
    }

    /// The underlying single-writer connection handle.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and release the connection.
    pub async fn close(&self) -> Result<(), RelayError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("journal WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the relay error type.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> RelayError {
    RelayError::Journal {
        source: Box::new(e),
    }
}
