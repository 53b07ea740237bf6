//! Output latch.
//!
//! Maps an [`Aggregate`] onto the four press outputs and runs the
//! edge-triggered log request:
//!
//! ```text
//!              cycle_complete rises,          log written,
//!              no request sent yet            request committed
//!   ┌──────┐ ─────────────────────────► ┌─────────┐ ───────────────► ┌──────┐
//!   │ Idle │                            │ Pending │                  │ Sent │
//!   └──────┘ ◄───────────────────────── └─────────┘                  └──────┘
//!      ▲            (never)                                              │
//!      └─────────────────────── cycle_complete falls ────────────────────┘
//! ```
//!
//! The latch only signals intent. The acquisition cycle broadcasts the
//! pending flag on its next run, writes the log entry, and then calls
//! [`OutputLatch::commit_log_request`].

use presslink_hardware::OutputLevels;
use serde::{Deserialize, Serialize};

use crate::aggregator::Aggregate;

/// Result of evaluating the latch for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatchDecision {
    /// Levels to write to the outputs this cycle.
    pub outputs: OutputLevels,

    /// A log write was requested on this evaluation (rising edge).
    pub datalogging_requested: bool,

    /// The sent request was cleared on this evaluation (falling edge).
    pub log_request_cleared: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputLatch {
    log_request_sent: bool,
    datalogging_pending: bool,
}

impl OutputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the transition rules for one cycle.
    pub fn evaluate(&mut self, aggregate: &Aggregate) -> LatchDecision {
        let outputs = OutputLevels {
            extend_press: aggregate.all_at_setpoint,
            cooling_air: aggregate.all_at_release,
            cycle_complete: aggregate.all_cycle_complete,
            lamp_faulted: aggregate.any_faulted,
        };

        let mut datalogging_requested = false;
        let mut log_request_cleared = false;

        if outputs.cycle_complete && !self.log_request_sent {
            datalogging_requested = !self.datalogging_pending;
            self.datalogging_pending = true;
        } else if !outputs.cycle_complete && self.log_request_sent {
            self.log_request_sent = false;
            log_request_cleared = true;
        }

        LatchDecision {
            outputs,
            datalogging_requested,
            log_request_cleared,
        }
    }

    /// Record that the pending log write was issued.
    pub fn commit_log_request(&mut self) {
        self.log_request_sent = true;
        self.datalogging_pending = false;
    }

    /// A log write is waiting to be broadcast and issued.
    pub fn datalogging_pending(&self) -> bool {
        self.datalogging_pending
    }

    pub fn log_request_sent(&self) -> bool {
        self.log_request_sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(value: bool) -> Aggregate {
        Aggregate {
            all_cycle_complete: value,
            ..Aggregate::EMPTY
        }
    }

    #[test]
    fn test_outputs_follow_aggregate() {
        let mut latch = OutputLatch::new();
        let decision = latch.evaluate(&Aggregate {
            all_at_setpoint: true,
            all_at_release: false,
            all_cycle_complete: true,
            any_faulted: true,
        });

        assert_eq!(
            decision.outputs,
            OutputLevels {
                extend_press: true,
                cooling_air: false,
                cycle_complete: true,
                lamp_faulted: true,
            }
        );
    }

    #[test]
    fn test_edge_trigger_sequence() {
        let mut latch = OutputLatch::new();
        let mut requested = 0;
        let mut cleared = 0;

        for value in [false, true, true, false] {
            let decision = latch.evaluate(&complete(value));
            if decision.datalogging_requested {
                requested += 1;
                latch.commit_log_request();
            }
            if decision.log_request_cleared {
                cleared += 1;
            }
        }

        assert_eq!(requested, 1);
        assert_eq!(cleared, 1);
        assert!(!latch.log_request_sent());
        assert!(!latch.datalogging_pending());
    }

    #[test]
    fn test_pending_request_is_not_repeated() {
        let mut latch = OutputLatch::new();

        assert!(latch.evaluate(&complete(true)).datalogging_requested);
        assert!(!latch.evaluate(&complete(true)).datalogging_requested);
        assert!(latch.datalogging_pending());

        latch.commit_log_request();
        assert!(!latch.datalogging_pending());
        assert!(!latch.evaluate(&complete(true)).datalogging_requested);
    }

    #[test]
    fn test_pending_survives_falling_edge_until_commit() {
        let mut latch = OutputLatch::new();
        latch.evaluate(&complete(true));

        let decision = latch.evaluate(&complete(false));
        assert!(!decision.log_request_cleared);
        assert!(latch.datalogging_pending());

        latch.commit_log_request();
        assert!(latch.evaluate(&complete(false)).log_request_cleared);
    }

    #[test]
    fn test_second_rising_edge_requests_again() {
        let mut latch = OutputLatch::new();

        for _ in 0..2 {
            assert!(latch.evaluate(&complete(true)).datalogging_requested);
            latch.commit_log_request();
            assert!(latch.evaluate(&complete(false)).log_request_cleared);
        }
    }

    #[test]
    fn test_no_clear_without_sent_request() {
        let mut latch = OutputLatch::new();
        for _ in 0..3 {
            let decision = latch.evaluate(&complete(false));
            assert!(!decision.log_request_cleared);
            assert!(!decision.datalogging_requested);
        }
    }
}
