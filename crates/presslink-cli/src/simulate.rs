//! Simulated press cell.
//!
//! Stands in for the press PLC and the heater child boards so the supervisor
//! can run without hardware. One press cycle goes:
//!
//! ```text
//! Idle ──start──► Heating ──setpoint──► Pressing ──dwell──► Cooling ──release──► Complete ──► Idle
//! ```
//!
//! The start and full-stroke inputs are driven here; the full-stroke line
//! follows the supervisor's extend-press output.

use std::time::Duration;

use presslink_core::{ChildAddress, ChildStatus};
use presslink_hardware::mock::{MockBusHandle, MockInputHandle, MockOutputHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const AMBIENT_C: f32 = 25.0;
const SETPOINT_C: f32 = 180.0;
const RELEASE_C: f32 = 60.0;
const HEAT_RATE_C: f32 = 12.0;
const COOL_RATE_C: f32 = 9.0;
const IDLE_STEPS: u32 = 10;
const DWELL_STEPS: u32 = 15;
const COMPLETE_STEPS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle { steps: u32 },
    Heating,
    Pressing { steps: u32 },
    Cooling,
    Complete { steps: u32 },
}

pub struct SimulatedCell {
    bus: MockBusHandle,
    addresses: Vec<ChildAddress>,
    start: MockInputHandle,
    full_stroke: MockInputHandle,
    extend_press: MockOutputHandle,
    step: Duration,
    phase: Phase,
    temperature: f32,
    cycles: u64,
}

impl SimulatedCell {
    pub fn new(
        bus: MockBusHandle,
        addresses: Vec<ChildAddress>,
        start: MockInputHandle,
        full_stroke: MockInputHandle,
        extend_press: MockOutputHandle,
        step: Duration,
    ) -> Self {
        let cell = Self {
            bus,
            addresses,
            start,
            full_stroke,
            extend_press,
            step,
            phase: Phase::Idle { steps: 0 },
            temperature: AMBIENT_C,
            cycles: 0,
        };
        cell.publish([false; 4]);
        cell
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.step);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => self.advance(),
            }
        }

        debug!(cycles = self.cycles, "Simulated cell stopped");
    }

    fn advance(&mut self) {
        let next = match self.phase {
            Phase::Idle { steps } if steps >= IDLE_STEPS => {
                self.start.set_level(true);
                info!(cycle = self.cycles + 1, "Simulated press cycle started");
                Phase::Heating
            }
            Phase::Idle { steps } => Phase::Idle { steps: steps + 1 },
            Phase::Heating => {
                self.temperature = (self.temperature + HEAT_RATE_C).min(SETPOINT_C);
                if self.temperature >= SETPOINT_C {
                    Phase::Pressing { steps: 0 }
                } else {
                    Phase::Heating
                }
            }
            Phase::Pressing { steps } => {
                self.full_stroke.set_level(self.extend_press.level());
                if self.full_stroke.level() && steps >= DWELL_STEPS {
                    Phase::Cooling
                } else if self.full_stroke.level() {
                    Phase::Pressing { steps: steps + 1 }
                } else {
                    Phase::Pressing { steps }
                }
            }
            Phase::Cooling => {
                self.temperature = (self.temperature - COOL_RATE_C).max(RELEASE_C);
                if self.temperature <= RELEASE_C {
                    self.full_stroke.set_level(false);
                    Phase::Complete { steps: 0 }
                } else {
                    Phase::Cooling
                }
            }
            Phase::Complete { steps } if steps >= COMPLETE_STEPS => {
                self.start.set_level(false);
                self.temperature = AMBIENT_C;
                self.cycles += 1;
                Phase::Idle { steps: 0 }
            }
            Phase::Complete { steps } => Phase::Complete { steps: steps + 1 },
        };

        if next != self.phase {
            debug!(from = ?self.phase, to = ?next, temperature = self.temperature, "Simulated phase");
        }
        self.phase = next;
        self.publish(self.flags());
    }

    /// `[at_setpoint, at_release, cycle_complete, faulted]` for the current phase.
    fn flags(&self) -> [bool; 4] {
        match self.phase {
            Phase::Idle { .. } | Phase::Heating => [false; 4],
            Phase::Pressing { .. } => [true, false, false, false],
            Phase::Cooling => [false, true, false, false],
            Phase::Complete { .. } => [false, true, true, false],
        }
    }

    fn publish(&self, flags: [bool; 4]) {
        self.bus
            .set_statuses(self.addresses.iter().enumerate().map(|(i, address)| {
                ChildStatus::from_flags(*address, flags)
                    .with_temperature(self.temperature + i as f32 * 0.5)
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presslink_core::PinId;
    use presslink_hardware::DigitalOutput;
    use presslink_hardware::mock::{MockBus, MockInputPin, MockOutputPin};

    fn pin(n: u8) -> PinId {
        PinId::new(n).unwrap()
    }

    #[test]
    fn test_cell_runs_full_press_cycle() {
        let address = ChildAddress::new(0x10).unwrap();
        let (_bus, bus) = MockBus::new(vec![address]);
        let (_start_pin, start) = MockInputPin::new(pin(5));
        let (_stroke_pin, full_stroke) = MockInputPin::new(pin(13));
        let (mut extend_pin, extend_press) = MockOutputPin::new(pin(16));

        let mut cell = SimulatedCell::new(
            bus.clone(),
            vec![address],
            start,
            full_stroke,
            extend_press,
            Duration::from_millis(100),
        );

        let mut saw_setpoint = false;
        let mut saw_complete = false;
        for _ in 0..200 {
            cell.advance();
            let status = bus.status(address).unwrap();
            // Play the supervisor: extend the press while at setpoint
            extend_pin.write(status.heater_at_setpoint).unwrap();
            saw_setpoint |= status.heater_at_setpoint;
            saw_complete |= status.heater_cycle_complete;
        }

        assert!(saw_setpoint);
        assert!(saw_complete);
        assert!(cell.cycles >= 1);
    }
}
