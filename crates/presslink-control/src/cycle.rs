//! One acquisition cycle.
//!
//! A cycle runs these stages in order, and any failure ends it before the
//! remaining stages:
//!
//! 1. **broadcast** the input levels and the pending datalogging flag
//! 2. **read** one raw buffer per child
//! 3. **process** the buffers into status records, writing a log entry if
//!    the broadcast carried the datalogging flag
//! 4. **aggregate** the records
//! 5. **latch** the aggregate into output levels
//! 6. **write** all four outputs
//!
//! A failed log write does not end the cycle. Output writes are synchronous,
//! so once stage 6 starts it finishes even if the caller's timeout fires.
//!
//! The [`CycleGuard`](crate::state::CycleGuard) is not touched here; the
//! runner in [`crate::scheduler`] releases it after [`AcquisitionCycle::run`]
//! returns or times out.

use std::sync::Arc;
use std::time::Duration;

use presslink_core::ChildStatus;
use presslink_hardware::devices::AnyDigitalOutput;
use presslink_hardware::{BroadcastFrame, BusClient, DigitalOutput, OutputBank, RawBuffer};
use presslink_storage::HeaterLogRepository;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::aggregator::{Aggregate, aggregate};
use crate::error::{ControlError, Operation, Result};
use crate::latch::{LatchDecision, OutputLatch};
use crate::state::SharedState;

/// What happened to the log request on this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogWrite {
    NotRequested,
    Written(usize),
    Failed(String),
}

/// Everything one successful cycle observed and decided.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_number: u64,
    pub frame: BroadcastFrame,
    pub statuses: Vec<ChildStatus>,
    pub aggregate: Aggregate,
    pub decision: LatchDecision,
    pub log_write: LogWrite,
    pub elapsed: Duration,
}

/// Cycle-owned state: the bus, the outputs, the log repository and the latch.
///
/// Only the cycle runner holds one of these, so none of it needs locking.
pub struct AcquisitionCycle<B, L, O = AnyDigitalOutput> {
    bus: B,
    outputs: OutputBank<O>,
    logs: L,
    latch: OutputLatch,
    state: Arc<SharedState>,
    buffers: Vec<RawBuffer>,
    cycle_number: u64,
}

impl<B, L, O> AcquisitionCycle<B, L, O>
where
    B: BusClient,
    L: HeaterLogRepository,
    O: DigitalOutput,
{
    pub fn new(bus: B, outputs: OutputBank<O>, logs: L, state: Arc<SharedState>) -> Self {
        Self {
            bus,
            outputs,
            logs,
            latch: OutputLatch::new(),
            state,
            buffers: Vec::new(),
            cycle_number: 0,
        }
    }

    /// Continue numbering after `cycle_number`, so a restarted supervisor
    /// does not reuse numbers already in the heater log.
    #[must_use]
    pub fn starting_after(mut self, cycle_number: u64) -> Self {
        self.cycle_number = cycle_number;
        self
    }

    /// Number of the most recently started cycle.
    pub fn cycle_number(&self) -> u64 {
        self.cycle_number
    }

    pub fn latch(&self) -> &OutputLatch {
        &self.latch
    }

    pub fn outputs(&self) -> &OutputBank<O> {
        &self.outputs
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Run every stage once.
    ///
    /// # Errors
    /// Returns `ControlError::Transport` naming the stage that failed.
    pub async fn run(&mut self) -> Result<CycleReport> {
        self.cycle_number += 1;
        let cycle_number = self.cycle_number;
        let started = Instant::now();

        let frame = self.broadcast().await?;
        debug!(cycle_number, frame = ?frame.as_array(), "Broadcast sent");

        self.read().await?;
        debug!(cycle_number, buffers = self.buffers.len(), "Buffers read");

        let (statuses, log_write) = self.process(cycle_number, frame.datalogging).await?;

        let aggregate = aggregate(&statuses);
        let decision = self.latch.evaluate(&aggregate);
        if decision.datalogging_requested {
            debug!(cycle_number, "Datalogging requested");
        }
        if decision.log_request_cleared {
            debug!(cycle_number, "Log request cleared");
        }

        self.outputs
            .write_all(&decision.outputs)
            .map_err(|e| ControlError::transport(Operation::WriteOutputs, e))?;

        let elapsed = started.elapsed();
        debug!(
            cycle_number,
            outputs = ?decision.outputs.as_array(),
            elapsed_us = elapsed.as_micros() as u64,
            "Cycle complete"
        );

        Ok(CycleReport {
            cycle_number,
            frame,
            statuses,
            aggregate,
            decision,
            log_write,
            elapsed,
        })
    }

    /// Drive every output low, e.g. on shutdown.
    pub fn drive_outputs_low(&mut self) -> Result<()> {
        self.outputs
            .drive_low()
            .map_err(|e| ControlError::transport(Operation::WriteOutputs, e))
    }

    async fn broadcast(&mut self) -> Result<BroadcastFrame> {
        let frame = BroadcastFrame::new(
            self.state.input_levels().snapshot(),
            self.latch.datalogging_pending(),
        );

        self.bus
            .broadcast(&frame)
            .await
            .map_err(|e| ControlError::transport(Operation::Broadcast, e))?;

        Ok(frame)
    }

    async fn read(&mut self) -> Result<()> {
        self.bus
            .read_all(&mut self.buffers)
            .await
            .map_err(|e| ControlError::transport(Operation::Read, e))
    }

    async fn process(
        &mut self,
        cycle_number: u64,
        datalogging: bool,
    ) -> Result<(Vec<ChildStatus>, LogWrite)> {
        let statuses = self
            .bus
            .process_all(&self.buffers)
            .map_err(|e| ControlError::transport(Operation::Process, e))?;

        if !datalogging {
            return Ok((statuses, LogWrite::NotRequested));
        }

        // The request is committed even when the write fails, so a broken
        // database is not hit again on every cycle until the next edge.
        let log_write = match self.logs.record_cycle(cycle_number, &statuses).await {
            Ok(rows) => {
                self.state.status().record_log_written(rows);
                debug!(cycle_number, rows, "Heater log written");
                LogWrite::Written(rows)
            }
            Err(e) => {
                self.state.status().record_log_failure();
                warn!(cycle_number, error = %e, "Heater log write failed");
                LogWrite::Failed(e.to_string())
            }
        };
        self.latch.commit_log_request();

        Ok((statuses, log_write))
    }
}
