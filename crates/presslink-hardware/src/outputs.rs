//! The four press outputs, written as one batch.

use presslink_core::{DigitalSignal, OutputSignal, PinId, constants::OUTPUT_SIGNAL_COUNT};
use tracing::warn;

use crate::Result;
use crate::devices::AnyDigitalOutput;
use crate::traits::DigitalOutput;
use crate::types::OutputLevels;

/// Output lines in `[extend_press, cooling_air, cycle_complete, lamp_faulted]` order.
///
/// # Examples
///
/// ```
/// use presslink_core::PinId;
/// use presslink_hardware::mock::MockOutputPin;
/// use presslink_hardware::{OutputBank, OutputLevels};
///
/// let (lines, handles): (Vec<_>, Vec<_>) = [16, 19, 20, 26]
///     .into_iter()
///     .map(|n| MockOutputPin::new(PinId::new(n).unwrap()))
///     .unzip();
/// let lines: [MockOutputPin; 4] = lines.try_into().unwrap();
///
/// let mut bank = OutputBank::new(lines);
/// bank.write_all(&OutputLevels { extend_press: true, ..Default::default() }).unwrap();
///
/// assert!(handles[0].level());
/// assert!(handles.iter().all(|h| h.write_count() == 1));
/// ```
#[derive(Debug)]
pub struct OutputBank<O = AnyDigitalOutput> {
    lines: [O; OUTPUT_SIGNAL_COUNT],
    last_written: Option<OutputLevels>,
}

impl<O: DigitalOutput> OutputBank<O> {
    pub fn new(lines: [O; OUTPUT_SIGNAL_COUNT]) -> Self {
        Self {
            lines,
            last_written: None,
        }
    }

    /// Write every output once, whether or not its level changed.
    ///
    /// All four writes are attempted even if one fails.
    ///
    /// # Errors
    /// Returns the first write error encountered.
    pub fn write_all(&mut self, levels: &OutputLevels) -> Result<()> {
        let mut first_error = None;

        for (line, signal) in self.lines.iter_mut().zip(OutputSignal::ALL) {
            if let Err(e) = line.write(levels.get(signal)) {
                warn!(%signal, pin = %line.pin(), error = %e, "Output write failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                self.last_written = Some(*levels);
                Ok(())
            }
        }
    }

    /// Drive every output low.
    ///
    /// # Errors
    /// Returns the first write error encountered.
    pub fn drive_low(&mut self) -> Result<()> {
        self.write_all(&OutputLevels::ALL_LOW)
    }

    pub fn pin(&self, signal: OutputSignal) -> PinId {
        self.lines[signal.index()].pin()
    }

    /// Levels from the last fully successful batch.
    pub fn last_written(&self) -> Option<OutputLevels> {
        self.last_written
    }

    /// Line snapshots built from the last successful batch.
    pub fn signals(&self) -> Vec<DigitalSignal> {
        let levels = self.last_written.unwrap_or_default();
        OutputSignal::ALL
            .iter()
            .map(|signal| DigitalSignal::output(self.pin(*signal), levels.get(*signal)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockOutputHandle, MockOutputPin};

    fn bank() -> (OutputBank<MockOutputPin>, Vec<MockOutputHandle>) {
        let (lines, handles): (Vec<_>, Vec<_>) = [16, 19, 20, 26]
            .into_iter()
            .map(|n| MockOutputPin::new(PinId::new(n).unwrap()))
            .unzip();
        let lines: [MockOutputPin; 4] = lines.try_into().unwrap();
        (OutputBank::new(lines), handles)
    }

    #[test]
    fn test_unchanged_levels_are_rewritten() {
        let (mut bank, handles) = bank();
        let levels = OutputLevels {
            cooling_air: true,
            ..Default::default()
        };

        bank.write_all(&levels).unwrap();
        bank.write_all(&levels).unwrap();

        assert!(handles.iter().all(|h| h.write_count() == 2));
        assert!(handles[1].level());
        assert_eq!(bank.last_written(), Some(levels));
    }

    #[test]
    fn test_failed_line_does_not_stop_others() {
        let (mut bank, handles) = bank();
        handles[1].set_fail(true);

        let levels = OutputLevels {
            extend_press: true,
            cooling_air: true,
            cycle_complete: true,
            lamp_faulted: true,
        };
        assert!(bank.write_all(&levels).is_err());

        assert!(handles[0].level());
        assert!(!handles[1].level());
        assert!(handles[2].level());
        assert!(handles[3].level());
        assert_eq!(bank.last_written(), None);
    }

    #[test]
    fn test_signals_snapshot() {
        let (mut bank, _handles) = bank();
        bank.write_all(&OutputLevels {
            lamp_faulted: true,
            ..Default::default()
        })
        .unwrap();

        let signals = bank.signals();
        assert_eq!(signals.len(), 4);
        assert_eq!(signals[3].pin.as_u8(), 26);
        assert!(signals[3].value);
        assert!(!signals[0].value);
    }
}
