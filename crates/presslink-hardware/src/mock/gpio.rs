//! Mock digital I/O lines.
//!
//! Inputs are driven through a [`MockInputHandle`] and deliver change
//! notifications over a watch channel. Outputs record their level and how
//! many times they were written, which lets tests check that every cycle
//! writes each output exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use presslink_core::PinId;
use tokio::sync::watch;

use crate::{
    HardwareError, Result,
    traits::{DigitalInput, DigitalOutput},
};

/// Mock input line.
///
/// # Examples
///
/// ```
/// use presslink_core::PinId;
/// use presslink_hardware::DigitalInput;
/// use presslink_hardware::mock::MockInputPin;
///
/// #[tokio::main]
/// async fn main() -> presslink_hardware::Result<()> {
///     let (mut pin, handle) = MockInputPin::new(PinId::new(5).unwrap());
///     assert!(!pin.read()?);
///
///     handle.set_level(true);
///     assert!(pin.wait_for_change().await?);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockInputPin {
    pin: PinId,
    level_rx: watch::Receiver<bool>,
}

impl MockInputPin {
    /// Create a mock input starting low.
    pub fn new(pin: PinId) -> (Self, MockInputHandle) {
        Self::with_level(pin, false)
    }

    /// Create a mock input starting at `level`.
    pub fn with_level(pin: PinId, level: bool) -> (Self, MockInputHandle) {
        let (level_tx, level_rx) = watch::channel(level);
        (Self { pin, level_rx }, MockInputHandle { pin, level_tx })
    }
}

impl DigitalInput for MockInputPin {
    fn pin(&self) -> PinId {
        self.pin
    }

    fn read(&self) -> Result<bool> {
        Ok(*self.level_rx.borrow())
    }

    async fn wait_for_change(&mut self) -> Result<bool> {
        self.level_rx
            .changed()
            .await
            .map_err(|_| HardwareError::disconnected(format!("{} input handle dropped", self.pin)))?;
        Ok(*self.level_rx.borrow_and_update())
    }
}

/// Handle for driving a mock input line.
#[derive(Debug, Clone)]
pub struct MockInputHandle {
    pin: PinId,
    level_tx: watch::Sender<bool>,
}

impl MockInputHandle {
    pub fn pin(&self) -> PinId {
        self.pin
    }

    /// Drive the line. Watchers are only woken when the level actually changes.
    pub fn set_level(&self, level: bool) {
        self.level_tx.send_if_modified(|current| {
            if *current == level {
                false
            } else {
                *current = level;
                true
            }
        });
    }

    pub fn level(&self) -> bool {
        *self.level_tx.borrow()
    }
}

#[derive(Debug, Default)]
struct OutputState {
    level: AtomicBool,
    writes: AtomicU64,
    fail: AtomicBool,
}

/// Mock output line.
#[derive(Debug)]
pub struct MockOutputPin {
    pin: PinId,
    state: Arc<OutputState>,
}

impl MockOutputPin {
    /// Create a mock output starting low.
    pub fn new(pin: PinId) -> (Self, MockOutputHandle) {
        let state = Arc::new(OutputState::default());
        let handle = MockOutputHandle {
            pin,
            state: Arc::clone(&state),
        };
        (Self { pin, state }, handle)
    }
}

impl DigitalOutput for MockOutputPin {
    fn pin(&self) -> PinId {
        self.pin
    }

    fn write(&mut self, level: bool) -> Result<()> {
        if self.state.fail.load(Ordering::Acquire) {
            return Err(HardwareError::write_failed(self.pin, "injected failure"));
        }
        self.state.level.store(level, Ordering::Release);
        self.state.writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

/// Handle for observing a mock output line.
#[derive(Debug, Clone)]
pub struct MockOutputHandle {
    pin: PinId,
    state: Arc<OutputState>,
}

impl MockOutputHandle {
    pub fn pin(&self) -> PinId {
        self.pin
    }

    /// Last level written to the line.
    pub fn level(&self) -> bool {
        self.state.level.load(Ordering::Acquire)
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> u64 {
        self.state.writes.load(Ordering::Acquire)
    }

    /// Make subsequent writes fail.
    pub fn set_fail(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::Release);
    }
}
