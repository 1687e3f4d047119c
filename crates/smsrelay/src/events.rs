// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stdin event source for inbound messages.
//!
//! Reads `from|body` lines from standard input and turns each into an
//! inbound event, mirroring how a platform integration would feed received
//! messages into the relay. Lets the daemon be driven from a terminal or a
//! piped script during development.

use smsrelay_sync::InboundEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Parse one input line into an event, `None` for lines to ignore.
fn parse_line(line: &str) -> Option<InboundEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once('|') {
        Some((from, body)) => Some(InboundEvent::new(from.trim(), body)),
        None => {
            warn!(line, "ignoring input line without 'from|body' separator");
            None
        }
    }
}

/// Spawns the stdin reader task.
///
/// The task exits on EOF or shutdown. EOF is not a shutdown: a daemon
/// started with a closed stdin simply runs without an inbound source.
pub fn spawn_stdin_source(tx: mpsc::Sender<InboundEvent>, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                next = lines.next_line() => match next {
                    Ok(Some(line)) => {
                        if let Some(event) = parse_line(&line) {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(None) => {
                        debug!("stdin closed, inbound event source finished");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read stdin, inbound event source finished");
                        break;
                    }
                },
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_from_and_body() {
        let event = parse_line("+15550001111|running late, be there at 6").unwrap();
        assert_eq!(event.from.as_deref(), Some("+15550001111"));
        assert_eq!(event.body.as_deref(), Some("running late, be there at 6"));
    }

    #[test]
    fn body_may_contain_further_separators() {
        let event = parse_line("+1555|a|b|c").unwrap();
        assert_eq!(event.body.as_deref(), Some("a|b|c"));
    }

    #[test]
    fn empty_body_is_preserved() {
        let event = parse_line("+1555|").unwrap();
        assert_eq!(event.body.as_deref(), Some(""));
    }

    #[test]
    fn blank_and_malformed_lines_are_ignored() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("no separator here").is_none());
    }
}
