//! Values exchanged between the supervisor and its hardware.

use bytes::Bytes;
use presslink_core::{ChildAddress, InputSignal, OutputSignal};
use serde::{Deserialize, Serialize};

/// Raw status buffer read from one child board.
///
/// The byte layout belongs to the bus implementation; the supervisor only
/// moves buffers from [`read_all`](crate::BusClient::read_all) to
/// [`process_all`](crate::BusClient::process_all).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBuffer {
    pub address: ChildAddress,
    pub bytes: Bytes,
}

impl RawBuffer {
    pub fn new(address: ChildAddress, bytes: impl Into<Bytes>) -> Self {
        Self {
            address,
            bytes: bytes.into(),
        }
    }
}

/// Values broadcast to every child at the start of a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastFrame {
    pub start: bool,
    pub stop: bool,
    pub full_stroke: bool,

    /// A log entry is pending for this cycle.
    pub datalogging: bool,
}

impl BroadcastFrame {
    /// Build a frame from input levels in `[start, stop, full_stroke]` order.
    #[must_use]
    pub fn new(inputs: [bool; 3], datalogging: bool) -> Self {
        let [start, stop, full_stroke] = inputs;
        Self {
            start,
            stop,
            full_stroke,
            datalogging,
        }
    }

    #[must_use]
    pub fn input(&self, signal: InputSignal) -> bool {
        match signal {
            InputSignal::Start => self.start,
            InputSignal::Stop => self.stop,
            InputSignal::FullStroke => self.full_stroke,
        }
    }

    /// Wire order: `[start, stop, full_stroke, datalogging]`.
    #[must_use]
    pub fn as_array(&self) -> [bool; 4] {
        [self.start, self.stop, self.full_stroke, self.datalogging]
    }
}

/// Levels for the four press outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLevels {
    pub extend_press: bool,
    pub cooling_air: bool,
    pub cycle_complete: bool,
    pub lamp_faulted: bool,
}

impl OutputLevels {
    /// Every output de-energized.
    pub const ALL_LOW: Self = Self {
        extend_press: false,
        cooling_air: false,
        cycle_complete: false,
        lamp_faulted: false,
    };

    #[must_use]
    pub fn get(&self, signal: OutputSignal) -> bool {
        match signal {
            OutputSignal::ExtendPress => self.extend_press,
            OutputSignal::CoolingAir => self.cooling_air,
            OutputSignal::CycleComplete => self.cycle_complete,
            OutputSignal::LampFaulted => self.lamp_faulted,
        }
    }

    /// Levels in `[extend_press, cooling_air, cycle_complete, lamp_faulted]` order.
    #[must_use]
    pub fn as_array(&self) -> [bool; 4] {
        OutputSignal::ALL.map(|signal| self.get(signal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_frame_order() {
        let frame = BroadcastFrame::new([true, false, true], true);

        assert_eq!(frame.as_array(), [true, false, true, true]);
        assert!(frame.input(InputSignal::Start));
        assert!(!frame.input(InputSignal::Stop));
        assert!(frame.input(InputSignal::FullStroke));
    }

    #[test]
    fn test_output_levels_order() {
        let levels = OutputLevels {
            extend_press: true,
            cooling_air: false,
            cycle_complete: false,
            lamp_faulted: true,
        };

        assert_eq!(levels.as_array(), [true, false, false, true]);
        assert_eq!(OutputLevels::ALL_LOW.as_array(), [false; 4]);
        assert_eq!(OutputLevels::default(), OutputLevels::ALL_LOW);
    }
}
