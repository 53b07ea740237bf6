//! Periodic scheduler and cycle runner.
//!
//! ```text
//! ┌───────────┐  tick   ┌──────────────┐  trigger  ┌─────────────┐
//! │ interval  │────────►│  Scheduler   │──────────►│ CycleRunner │
//! │ (50 ms)   │         │ ready? guard?│  mpsc(1)  │ run+timeout │
//! └───────────┘         └──────────────┘           └─────────────┘
//!                              │ sets guard               │ releases guard
//!                              └──────► SharedState ◄─────┘
//! ```
//!
//! The scheduler never queues work: a tick that finds the system not ready,
//! or a cycle still in flight, is dropped and counted. The runner owns the
//! [`AcquisitionCycle`] and bounds every run with a timeout.
//!
//! # Examples
//!
//! ```no_run
//! use presslink_control::scheduler::{self, SchedulerConfig};
//! use presslink_control::{AcquisitionCycle, SharedState};
//! # use presslink_hardware::devices::AnyBus;
//! # use presslink_storage::SqliteHeaterLogRepository;
//!
//! # async fn example(
//! #     cycle: AcquisitionCycle<AnyBus, SqliteHeaterLogRepository>,
//! #     state: std::sync::Arc<SharedState>,
//! # ) {
//! let handle = scheduler::spawn(cycle, state, SchedulerConfig::default());
//!
//! tokio::signal::ctrl_c().await.ok();
//! handle.shutdown().await;
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use presslink_core::ControllerConfig;
use presslink_core::constants::{DEFAULT_CYCLE_PERIOD_MS, DEFAULT_CYCLE_TIMEOUT_MS};
use presslink_hardware::{BusClient, DigitalOutput};
use presslink_storage::HeaterLogRepository;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::cycle::AcquisitionCycle;
use crate::error::ControlError;
use crate::state::SharedState;
use crate::status::CycleOutcome;

/// Timing for the scheduler and runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub period: Duration,
    pub cycle_timeout: Duration,
}

impl SchedulerConfig {
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            period: config.cycle_period(),
            cycle_timeout: config.cycle_timeout(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(DEFAULT_CYCLE_PERIOD_MS),
            cycle_timeout: Duration::from_millis(DEFAULT_CYCLE_TIMEOUT_MS),
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A cycle was started.
    Started,
    /// The system is not ready; nothing happened.
    NotReady,
    /// A cycle is already in flight; the tick was dropped.
    Busy,
    /// The runner is gone.
    Stopped,
}

/// Request for the runner to start one cycle.
#[derive(Debug)]
pub struct CycleTrigger;

pub struct Scheduler {
    period: Duration,
    state: Arc<SharedState>,
    triggers: mpsc::Sender<CycleTrigger>,
}

impl Scheduler {
    /// Create a scheduler and the trigger receiver for its runner.
    pub fn new(period: Duration, state: Arc<SharedState>) -> (Self, mpsc::Receiver<CycleTrigger>) {
        // Capacity 1: the guard is held while a trigger is queued
        let (triggers, rx) = mpsc::channel(1);
        (
            Self {
                period,
                state,
                triggers,
            },
            rx,
        )
    }

    /// Decide whether to start a cycle now.
    pub fn tick(&self) -> TickOutcome {
        let status = self.state.status();

        if !self.state.readiness().is_ready() {
            status.record_tick_not_ready();
            trace!("Tick dropped, system not ready");
            return TickOutcome::NotReady;
        }

        if !self.state.guard().try_acquire() {
            status.record_tick_busy();
            debug!("Tick dropped, cycle in flight");
            return TickOutcome::Busy;
        }

        match self.triggers.try_send(CycleTrigger) {
            Ok(()) => {
                status.record_tick_started();
                TickOutcome::Started
            }
            Err(TrySendError::Full(_)) => {
                // A trigger is still queued for the runner
                self.state.guard().release();
                status.record_tick_busy();
                debug!("Tick dropped, trigger already queued");
                TickOutcome::Busy
            }
            Err(TrySendError::Closed(_)) => {
                self.state.guard().release();
                TickOutcome::Stopped
            }
        }
    }

    /// Tick every period until cancelled or the runner goes away.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(period_ms = self.period.as_millis() as u64, "Scheduler started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if self.tick() == TickOutcome::Stopped {
                        warn!("Cycle runner gone, scheduler stopping");
                        break;
                    }
                }
            }
        }

        debug!("Scheduler stopped");
    }
}

/// Owns the acquisition cycle and runs it once per trigger.
pub struct CycleRunner<B, L, O> {
    cycle: AcquisitionCycle<B, L, O>,
    state: Arc<SharedState>,
    cycle_timeout: Duration,
    triggers: mpsc::Receiver<CycleTrigger>,
}

impl<B, L, O> CycleRunner<B, L, O>
where
    B: BusClient,
    L: HeaterLogRepository,
    O: DigitalOutput,
{
    pub fn new(
        cycle: AcquisitionCycle<B, L, O>,
        state: Arc<SharedState>,
        cycle_timeout: Duration,
        triggers: mpsc::Receiver<CycleTrigger>,
    ) -> Self {
        Self {
            cycle,
            state,
            cycle_timeout,
            triggers,
        }
    }

    /// Serve triggers until cancelled, then drive the outputs low.
    ///
    /// A cycle that has started is allowed to finish (or time out) before
    /// cancellation is observed.
    pub async fn run(mut self, cancel: CancellationToken) -> AcquisitionCycle<B, L, O> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                trigger = self.triggers.recv() => match trigger {
                    Some(CycleTrigger) => self.run_once().await,
                    None => break,
                },
            }
        }

        self.triggers.close();
        self.state.guard().release();

        match self.cycle.drive_outputs_low() {
            Ok(()) => info!("Outputs driven low"),
            Err(e) => error!(error = %e, "Failed to drive outputs low"),
        }

        self.cycle
    }

    /// Run one cycle under the timeout and release the guard afterwards.
    pub async fn run_once(&mut self) {
        let result = tokio::time::timeout(self.cycle_timeout, self.cycle.run()).await;
        let cycle_number = self.cycle.cycle_number();
        let status = self.state.status();

        match result {
            Ok(Ok(report)) => {
                status.record_outcome(
                    cycle_number,
                    CycleOutcome::Completed,
                    Some(report.decision.outputs),
                );
            }
            Ok(Err(e)) => {
                warn!(cycle_number, kind = ?e.kind(), error = %e, "Cycle failed");
                status.record_outcome(cycle_number, CycleOutcome::Failed(e.kind()), None);
            }
            Err(_) => {
                let e = ControlError::Timeout {
                    duration_ms: self.cycle_timeout.as_millis() as u64,
                };
                error!(cycle_number, error = %e, "Cycle abandoned");
                status.record_outcome(cycle_number, CycleOutcome::TimedOut, None);
            }
        }

        self.state.guard().release();
    }
}

/// Handle for a spawned scheduler and runner.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    tasks: JoinSet<()>,
    state: Arc<SharedState>,
}

impl SchedulerHandle {
    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// Token cancelled by [`shutdown`](Self::shutdown).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop ticking, let any in-flight cycle finish, and drive outputs low.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();

        let mut panic_count = 0;
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result
                && e.is_panic()
            {
                panic_count += 1;
            }
        }

        if panic_count > 0 {
            error!(panic_count, "Scheduler tasks panicked");
        } else {
            info!("Scheduler shut down");
        }
    }
}

/// Spawn the scheduler and its runner.
pub fn spawn<B, L, O>(
    cycle: AcquisitionCycle<B, L, O>,
    state: Arc<SharedState>,
    config: SchedulerConfig,
) -> SchedulerHandle
where
    B: BusClient + 'static,
    L: HeaterLogRepository + 'static,
    O: DigitalOutput + 'static,
{
    let cancel = CancellationToken::new();
    let (scheduler, triggers) = Scheduler::new(config.period, Arc::clone(&state));
    let runner = CycleRunner::new(cycle, Arc::clone(&state), config.cycle_timeout, triggers);

    let mut tasks = JoinSet::new();
    let token = cancel.clone();
    tasks.spawn(async move {
        runner.run(token).await;
    });
    tasks.spawn(scheduler.run(cancel.clone()));

    SchedulerHandle {
        cancel,
        tasks,
        state,
    }
}
