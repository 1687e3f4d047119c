// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-attempt state machine.
//!
//! Each job-scheduler invocation of a pipeline is one [`SyncAttempt`]. The
//! phases make the implicit lifecycle of the external retry machinery
//! explicit: outbound walks Idle -> (Acknowledging) -> Fetching ->
//! Dispatching -> Acknowledging -> Done, inbound walks Idle -> Forwarding ->
//! Done. Any non-terminal phase may fall to RetryScheduled (transient
//! failure, scheduler re-enters at Idle) or Abandoned (permanent failure,
//! only a fresh triggering event starts over).

use smsrelay_core::{RelayError, SyncDirection};
use tracing::trace;

/// Phase of one sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    /// Outbound only: requesting the pending batch.
    Fetching,
    /// Outbound only: handing messages to the device transport.
    Dispatching,
    /// Outbound only: reporting dispatched ids to the backend.
    Acknowledging,
    /// Inbound only: forwarding the captured message.
    Forwarding,
    Done,
    /// Transient failure; the scheduler will re-enter Idle after backoff.
    RetryScheduled,
    /// Permanent failure; reported, not retried.
    Abandoned,
}

impl SyncPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SyncPhase::Done | SyncPhase::Abandoned)
    }
}

/// One invocation of a pipeline, as seen by the retry contract.
#[derive(Debug)]
pub struct SyncAttempt {
    direction: SyncDirection,
    phase: SyncPhase,
    attempt: u32,
}

impl SyncAttempt {
    /// Start a new attempt. `attempt` is 1-based: the scheduler passes the
    /// invocation count for this triggering event.
    pub fn new(direction: SyncDirection, attempt: u32) -> Self {
        Self {
            direction,
            phase: SyncPhase::Idle,
            attempt,
        }
    }

    pub fn direction(&self) -> SyncDirection {
        self.direction
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Move to the next phase, rejecting transitions the lifecycle does not
    /// allow. An illegal transition is a pipeline bug, not an environmental
    /// failure, so it surfaces as a permanent internal error.
    pub fn advance(&mut self, next: SyncPhase) -> Result<(), RelayError> {
        if !legal(self.direction, self.phase, next) {
            return Err(RelayError::Internal(format!(
                "illegal {} phase transition {:?} -> {next:?}",
                self.direction, self.phase
            )));
        }
        trace!(
            direction = %self.direction,
            attempt = self.attempt,
            from = ?self.phase,
            to = ?next,
            "sync phase transition"
        );
        self.phase = next;
        Ok(())
    }
}

fn legal(direction: SyncDirection, from: SyncPhase, to: SyncPhase) -> bool {
    use SyncPhase::*;

    // Failure edges are shared: any non-terminal phase may fail.
    if matches!(to, RetryScheduled) && !from.is_terminal() && from != RetryScheduled {
        return true;
    }
    if matches!(to, Abandoned) && !from.is_terminal() && from != Abandoned {
        return true;
    }

    match direction {
        SyncDirection::Outbound => matches!(
            (from, to),
            // Resume path acknowledges leftovers before fetching.
            (Idle, Acknowledging)
                | (Idle, Fetching)
                | (Acknowledging, Fetching)
                | (Fetching, Dispatching)
                // Empty batch, nothing to do.
                | (Fetching, Done)
                | (Dispatching, Acknowledging)
                | (Acknowledging, Done)
        ),
        SyncDirection::Inbound => matches!(
            (from, to),
            (Idle, Forwarding)
                // Unusable trigger payload is a successful no-op.
                | (Idle, Done)
                | (Forwarding, Done)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_happy_path() {
        let mut attempt = SyncAttempt::new(SyncDirection::Outbound, 1);
        attempt.advance(SyncPhase::Fetching).unwrap();
        attempt.advance(SyncPhase::Dispatching).unwrap();
        attempt.advance(SyncPhase::Acknowledging).unwrap();
        attempt.advance(SyncPhase::Done).unwrap();
        assert!(attempt.phase().is_terminal());
    }

    #[test]
    fn outbound_resume_path_acknowledges_before_fetch() {
        let mut attempt = SyncAttempt::new(SyncDirection::Outbound, 2);
        attempt.advance(SyncPhase::Acknowledging).unwrap();
        attempt.advance(SyncPhase::Fetching).unwrap();
        attempt.advance(SyncPhase::Done).unwrap();
    }

    #[test]
    fn inbound_paths() {
        let mut forward = SyncAttempt::new(SyncDirection::Inbound, 1);
        forward.advance(SyncPhase::Forwarding).unwrap();
        forward.advance(SyncPhase::Done).unwrap();

        let mut noop = SyncAttempt::new(SyncDirection::Inbound, 1);
        noop.advance(SyncPhase::Done).unwrap();
    }

    #[test]
    fn any_active_phase_may_fail_transiently_or_permanently() {
        let mut attempt = SyncAttempt::new(SyncDirection::Outbound, 1);
        attempt.advance(SyncPhase::Fetching).unwrap();
        attempt.advance(SyncPhase::RetryScheduled).unwrap();

        let mut attempt = SyncAttempt::new(SyncDirection::Outbound, 1);
        attempt.advance(SyncPhase::Fetching).unwrap();
        attempt.advance(SyncPhase::Dispatching).unwrap();
        attempt.advance(SyncPhase::Abandoned).unwrap();
    }

    #[test]
    fn terminal_phases_reject_further_transitions() {
        let mut attempt = SyncAttempt::new(SyncDirection::Inbound, 1);
        attempt.advance(SyncPhase::Done).unwrap();
        assert!(attempt.advance(SyncPhase::Forwarding).is_err());
        assert!(attempt.advance(SyncPhase::RetryScheduled).is_err());
    }

    #[test]
    fn cross_direction_phases_are_rejected() {
        let mut inbound = SyncAttempt::new(SyncDirection::Inbound, 1);
        assert!(inbound.advance(SyncPhase::Fetching).is_err());

        let mut outbound = SyncAttempt::new(SyncDirection::Outbound, 1);
        assert!(outbound.advance(SyncPhase::Forwarding).is_err());
    }

    #[test]
    fn dispatch_cannot_be_skipped_into_from_idle() {
        let mut attempt = SyncAttempt::new(SyncDirection::Outbound, 1);
        assert!(attempt.advance(SyncPhase::Dispatching).is_err());
    }
}
