//! Input watcher.
//!
//! The watcher keeps [`InputLevels`] in step with the physical input lines.
//! It runs independently of the acquisition cycle: one task per input waits
//! for level changes and stores the new level atomically. The cycle only ever
//! loads those levels when it builds its broadcast frame.
//!
//! ```text
//! ┌──────────┐
//! │ start    │──┐
//! │ task     │  │      ┌──────────────┐
//! └──────────┘  │      │              │
//! ┌──────────┐  ├─────►│ InputLevels  │──────► acquisition cycle
//! │ stop     │──┤      │ (atomics)    │
//! │ task     │  │      │              │
//! └──────────┘  │      └──────────────┘
//! ┌──────────┐  │
//! │ full     │──┘
//! │ stroke   │
//! └──────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use presslink_core::{InputSignal, PinId};
//! use presslink_hardware::devices::AnyDigitalInput;
//! use presslink_hardware::mock::MockInputPin;
//! use presslink_hardware::watcher::InputWatcher;
//!
//! #[tokio::main]
//! async fn main() -> presslink_hardware::Result<()> {
//!     let mut watcher = InputWatcher::new();
//!
//!     let (start, start_line) = MockInputPin::new(PinId::new(5).unwrap());
//!     watcher.register(InputSignal::Start, AnyDigitalInput::Mock(start));
//!
//!     let levels = watcher.levels();
//!     let handle = watcher.start();
//!
//!     start_line.set_level(true);
//!     // ...
//!     assert!(levels.get(InputSignal::Start));
//!
//!     handle.shutdown().await
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use presslink_core::{DigitalSignal, InputSignal, PinId};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::Result;
use crate::devices::AnyDigitalInput;
use crate::traits::DigitalInput;

/// Latest level of each press input.
///
/// Written by the watcher tasks, read by the acquisition cycle.
#[derive(Debug, Default)]
pub struct InputLevels {
    start: AtomicBool,
    stop: AtomicBool,
    full_stroke: AtomicBool,
}

impl InputLevels {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, signal: InputSignal) -> &AtomicBool {
        match signal {
            InputSignal::Start => &self.start,
            InputSignal::Stop => &self.stop,
            InputSignal::FullStroke => &self.full_stroke,
        }
    }

    pub fn get(&self, signal: InputSignal) -> bool {
        self.slot(signal).load(Ordering::Acquire)
    }

    /// Store a level and return the previous one.
    pub fn set(&self, signal: InputSignal, level: bool) -> bool {
        self.slot(signal).swap(level, Ordering::AcqRel)
    }

    /// Levels in `[start, stop, full_stroke]` order.
    pub fn snapshot(&self) -> [bool; 3] {
        InputSignal::ALL.map(|signal| self.get(signal))
    }

    /// Line snapshots for the given pin assignment.
    pub fn signals(&self, pins: &[PinId; 3]) -> Vec<DigitalSignal> {
        InputSignal::ALL
            .iter()
            .map(|signal| DigitalSignal::input(pins[signal.index()], self.get(*signal)))
            .collect()
    }
}

/// Handle for the running watcher tasks.
pub struct WatcherHandle {
    levels: Arc<InputLevels>,
    tasks: JoinSet<Result<()>>,
}

impl WatcherHandle {
    pub fn levels(&self) -> Arc<InputLevels> {
        Arc::clone(&self.levels)
    }

    /// Number of watcher tasks spawned and not yet joined.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Stop all watcher tasks.
    ///
    /// Task errors and panics are logged, not returned.
    pub async fn shutdown(mut self) -> Result<()> {
        self.tasks.abort_all();

        let mut error_count = 0;
        let mut panic_count = 0;

        while let Some(result) = self.tasks.join_next().await {
            match classify_task_result(result) {
                TaskTermination::Success | TaskTermination::Cancelled => {}
                TaskTermination::Error => error_count += 1,
                TaskTermination::Panic => panic_count += 1,
            }
        }

        if error_count + panic_count > 0 {
            warn!(error_count, panic_count, "Input watcher stopped with failures");
        } else {
            debug!("Input watcher stopped");
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    Error,
    Cancelled,
    Panic,
}

fn classify_task_result(
    result: std::result::Result<Result<()>, tokio::task::JoinError>,
) -> TaskTermination {
    match result {
        Ok(Ok(())) => TaskTermination::Success,
        Ok(Err(_)) => TaskTermination::Error,
        Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
        Err(_) => TaskTermination::Panic,
    }
}

/// Spawns one task per registered input line.
pub struct InputWatcher {
    inputs: Vec<(InputSignal, AnyDigitalInput)>,
    levels: Arc<InputLevels>,
}

impl InputWatcher {
    pub fn new() -> Self {
        Self::with_levels(Arc::new(InputLevels::new()))
    }

    /// Create a watcher that writes into existing levels.
    pub fn with_levels(levels: Arc<InputLevels>) -> Self {
        Self {
            inputs: Vec::new(),
            levels,
        }
    }

    /// Register the line for a signal, replacing any earlier registration.
    pub fn register(&mut self, signal: InputSignal, input: AnyDigitalInput) {
        self.inputs.retain(|(s, _)| *s != signal);
        self.inputs.push((signal, input));
    }

    pub fn levels(&self) -> Arc<InputLevels> {
        Arc::clone(&self.levels)
    }

    /// Spawn the watcher tasks.
    ///
    /// Each task seeds its level with an initial read before waiting for changes.
    pub fn start(self) -> WatcherHandle {
        let mut tasks = JoinSet::new();

        for (signal, input) in self.inputs {
            tasks.spawn(Self::watch_task(signal, input, Arc::clone(&self.levels)));
        }

        info!(inputs = tasks.len(), "Input watcher started");

        WatcherHandle {
            levels: self.levels,
            tasks,
        }
    }

    async fn watch_task(
        signal: InputSignal,
        mut input: AnyDigitalInput,
        levels: Arc<InputLevels>,
    ) -> Result<()> {
        // Rate limiting: minimum delay between updates to absorb contact bounce
        const MIN_POLL_INTERVAL_MS: u64 = 10; // 100 Hz maximum

        let pin = input.pin();
        let initial = input.read()?;
        levels.set(signal, initial);
        debug!(%signal, %pin, level = initial, "Input seeded");

        loop {
            let start = tokio::time::Instant::now();

            match input.wait_for_change().await {
                Ok(level) => {
                    let previous = levels.set(signal, level);
                    if previous != level {
                        debug!(%signal, %pin, level, "Input changed");
                    }
                }
                Err(e) => {
                    warn!(%signal, %pin, error = %e, "Input watch failed");
                    return Err(e);
                }
            }

            let elapsed = start.elapsed();
            if elapsed.as_millis() < MIN_POLL_INTERVAL_MS as u128 {
                tokio::time::sleep(tokio::time::Duration::from_millis(MIN_POLL_INTERVAL_MS) - elapsed)
                    .await;
            }
        }
    }
}

impl Default for InputWatcher {
    fn default() -> Self {
        Self::new()
    }
}
