//! State shared between the scheduler, the cycle runner and the input watcher.
//!
//! Everything here is lock-free. Cycle-owned state (latch, bus, outputs)
//! lives in the runner task instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use presslink_hardware::InputLevels;

use crate::status::{StatusBoard, StatusReport};

/// At most one acquisition cycle in flight.
///
/// Set by the scheduler before a cycle starts, released by the runner after
/// the output writes, a failure, or a timeout.
#[derive(Debug, Default)]
pub struct CycleGuard {
    active: AtomicBool,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard. Returns `false` if a cycle is already in flight.
    pub fn try_acquire(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Startup progress. Ready only once every step has succeeded.
#[derive(Debug, Default)]
pub struct SystemReadiness {
    bus_ready: AtomicBool,
    persistence_ready: AtomicBool,
    addresses_mapped: AtomicBool,
}

impl SystemReadiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_bus_ready(&self) {
        self.bus_ready.store(true, Ordering::Release);
    }

    pub fn mark_persistence_ready(&self) {
        self.persistence_ready.store(true, Ordering::Release);
    }

    pub fn mark_addresses_mapped(&self) {
        self.addresses_mapped.store(true, Ordering::Release);
    }

    pub fn bus_ready(&self) -> bool {
        self.bus_ready.load(Ordering::Acquire)
    }

    pub fn persistence_ready(&self) -> bool {
        self.persistence_ready.load(Ordering::Acquire)
    }

    pub fn addresses_mapped(&self) -> bool {
        self.addresses_mapped.load(Ordering::Acquire)
    }

    pub fn is_ready(&self) -> bool {
        self.bus_ready() && self.persistence_ready() && self.addresses_mapped()
    }
}

/// Shared application state, handed around as `Arc<SharedState>`.
#[derive(Debug, Default)]
pub struct SharedState {
    inputs: Arc<InputLevels>,
    guard: CycleGuard,
    readiness: SystemReadiness,
    status: StatusBoard,
}

impl SharedState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Input levels, shared with the input watcher.
    pub fn inputs(&self) -> Arc<InputLevels> {
        Arc::clone(&self.inputs)
    }

    pub fn input_levels(&self) -> &InputLevels {
        &self.inputs
    }

    pub fn guard(&self) -> &CycleGuard {
        &self.guard
    }

    pub fn readiness(&self) -> &SystemReadiness {
        &self.readiness
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    /// Snapshot for the status log line.
    pub fn report(&self) -> StatusReport {
        self.status
            .snapshot(&self.readiness, self.guard.is_active(), self.inputs.snapshot())
    }
}
