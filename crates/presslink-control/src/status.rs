//! Supervisor status board.
//!
//! Counters are plain atomics updated by the scheduler and the cycle runner.
//! [`StatusBoard::snapshot`] turns them into a serializable
//! [`StatusReport`], which the binary logs periodically.
//!
//! # Examples
//!
//! ```
//! use presslink_control::status::{CycleOutcome, StatusBoard};
//! use presslink_control::state::SystemReadiness;
//!
//! let board = StatusBoard::new();
//! board.record_outcome(7, CycleOutcome::Completed, None);
//!
//! let report = board.snapshot(&SystemReadiness::new(), false, [false; 3]);
//! assert_eq!(report.cycles_completed, 1);
//! assert_eq!(report.last_cycle.unwrap().cycle_number, 7);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use presslink_hardware::OutputLevels;
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::state::SystemReadiness;

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    Completed,
    Failed(ErrorKind),
    TimedOut,
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed(kind) => write!(f, "failed ({kind:?})"),
            Self::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Last recorded cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastCycle {
    pub cycle_number: u64,
    pub outcome: CycleOutcome,
    pub outputs: Option<OutputLevels>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct StatusBoard {
    ticks_started: AtomicU64,
    ticks_dropped_busy: AtomicU64,
    ticks_dropped_not_ready: AtomicU64,
    cycles_completed: AtomicU64,
    cycles_failed: AtomicU64,
    cycles_timed_out: AtomicU64,
    log_entries_written: AtomicU64,
    log_failures: AtomicU64,
    last_cycle: Mutex<Option<LastCycle>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick_started(&self) {
        self.ticks_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_busy(&self) {
        self.ticks_dropped_busy.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_not_ready(&self) {
        self.ticks_dropped_not_ready.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_log_written(&self, rows: usize) {
        self.log_entries_written
            .fetch_add(rows as u64, Ordering::Relaxed);
    }

    pub fn record_log_failure(&self) {
        self.log_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a finished cycle and remember it as the last one.
    pub fn record_outcome(
        &self,
        cycle_number: u64,
        outcome: CycleOutcome,
        outputs: Option<OutputLevels>,
    ) {
        let counter = match outcome {
            CycleOutcome::Completed => &self.cycles_completed,
            CycleOutcome::Failed(_) => &self.cycles_failed,
            CycleOutcome::TimedOut => &self.cycles_timed_out,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        *self.last_cycle.lock() = Some(LastCycle {
            cycle_number,
            outcome,
            outputs,
            finished_at: Utc::now(),
        });
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    pub fn cycles_failed(&self) -> u64 {
        self.cycles_failed.load(Ordering::Relaxed)
    }

    pub fn cycles_timed_out(&self) -> u64 {
        self.cycles_timed_out.load(Ordering::Relaxed)
    }

    pub fn ticks_dropped_busy(&self) -> u64 {
        self.ticks_dropped_busy.load(Ordering::Relaxed)
    }

    pub fn ticks_dropped_not_ready(&self) -> u64 {
        self.ticks_dropped_not_ready.load(Ordering::Relaxed)
    }

    pub fn log_entries_written(&self) -> u64 {
        self.log_entries_written.load(Ordering::Relaxed)
    }

    pub fn log_failures(&self) -> u64 {
        self.log_failures.load(Ordering::Relaxed)
    }

    pub fn last_cycle(&self) -> Option<LastCycle> {
        self.last_cycle.lock().clone()
    }

    pub fn snapshot(
        &self,
        readiness: &SystemReadiness,
        cycle_active: bool,
        inputs: [bool; 3],
    ) -> StatusReport {
        StatusReport {
            ready: readiness.is_ready(),
            bus_ready: readiness.bus_ready(),
            persistence_ready: readiness.persistence_ready(),
            addresses_mapped: readiness.addresses_mapped(),
            cycle_active,
            inputs,
            ticks_started: self.ticks_started.load(Ordering::Relaxed),
            ticks_dropped_busy: self.ticks_dropped_busy(),
            ticks_dropped_not_ready: self.ticks_dropped_not_ready(),
            cycles_completed: self.cycles_completed(),
            cycles_failed: self.cycles_failed(),
            cycles_timed_out: self.cycles_timed_out(),
            log_entries_written: self.log_entries_written(),
            log_failures: self.log_failures(),
            last_cycle: self.last_cycle(),
        }
    }
}

/// Point-in-time view of the supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub ready: bool,
    pub bus_ready: bool,
    pub persistence_ready: bool,
    pub addresses_mapped: bool,
    pub cycle_active: bool,

    /// `[start, stop, full_stroke]`
    pub inputs: [bool; 3],

    pub ticks_started: u64,
    pub ticks_dropped_busy: u64,
    pub ticks_dropped_not_ready: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub cycles_timed_out: u64,
    pub log_entries_written: u64,
    pub log_failures: u64,
    pub last_cycle: Option<LastCycle>,
}
