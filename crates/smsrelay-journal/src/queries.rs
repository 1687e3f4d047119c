// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed operations on the dispatched-but-unacknowledged record.
//!
//! The write ordering is the correctness contract of the outbound pipeline:
//! `record_dispatched` runs BEFORE the device transport send, and
//! `mark_acknowledged` runs only after the backend confirmed mark-sent.
//! Everything in between surviving a crash is recoverable state.

use rusqlite::params;
use smsrelay_core::RelayError;

use crate::database::{Database, map_tr_err};

/// Record a message id as about to be handed to the device transport.
///
/// Returns `true` if this call inserted the row, `false` if the id was
/// already present. The insert is the claim: when two invocations of the
/// same cycle race, exactly one observes `true` and performs the send,
/// which is what keeps concurrent re-triggers from double-sending.
pub async fn record_dispatched(db: &Database, id: i64, phone: &str) -> Result<bool, RelayError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO dispatched (message_id, phone) VALUES (?1, ?2)",
                params![id, phone],
            )?;
            Ok(inserted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Withdraw a recorded id after the transport primitive failed cleanly.
///
/// Only valid when the caller KNOWS the send did not happen (the transport
/// returned an error, as opposed to the process dying mid-send). The
/// message stays pending at the backend and will be re-fetched.
pub async fn remove_dispatched(db: &Database, id: i64) -> Result<(), RelayError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM dispatched WHERE message_id = ?1 AND acknowledged = 0",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All ids dispatched but not yet acknowledged, in id order.
///
/// On resumption after a failed acknowledge these are exactly the ids that
/// must be re-acknowledged without touching the transport again.
pub async fn unacknowledged(db: &Database) -> Result<Vec<i64>, RelayError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id FROM dispatched
                 WHERE acknowledged = 0
                 ORDER BY message_id ASC",
            )?;
            let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(row?);
            }
            Ok(ids)
        })
        .await
        .map_err(map_tr_err)
}

/// Whether an id has already been dispatched (acknowledged or not).
///
/// Backend ids are never reused, so a hit here always means "do not send
/// this message again".
pub async fn is_dispatched(db: &Database, id: i64) -> Result<bool, RelayError> {
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM dispatched WHERE message_id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Flip the given ids to acknowledged, in one transaction.
///
/// Called only after the backend's mark-sent endpoint returned success for
/// exactly this id set.
pub async fn mark_acknowledged(db: &Database, ids: &[i64]) -> Result<(), RelayError> {
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "UPDATE dispatched
                     SET acknowledged = 1,
                         acknowledged_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE message_id = ?1",
                )?;
                for id in &ids {
                    stmt.execute(params![id])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete acknowledged rows beyond the newest `keep`, returning the number
/// of rows removed.
///
/// Keeps the journal bounded over months of operation. Unacknowledged rows
/// are never pruned, and ids are never reused by the backend, so pruning
/// cannot reintroduce a duplicate send.
pub async fn prune_acknowledged(db: &Database, keep: u32) -> Result<usize, RelayError> {
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM dispatched
                 WHERE acknowledged = 1
                   AND message_id NOT IN (
                       SELECT message_id FROM dispatched
                       WHERE acknowledged = 1
                       ORDER BY message_id DESC
                       LIMIT ?1
                   )",
                params![keep],
            )?;
            Ok(removed)
        })
        .await
        .map_err(map_tr_err)
}
