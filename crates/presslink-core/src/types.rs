use crate::{
    Result,
    constants::{MAX_CHILD_ADDRESS, MAX_GPIO_PIN, MIN_CHILD_ADDRESS},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// GPIO line number on the supervisor header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PinId(u8);

impl PinId {
    /// Create a new pin id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPin` if the pin is above [`MAX_GPIO_PIN`].
    pub fn new(pin: u8) -> Result<Self> {
        if pin > MAX_GPIO_PIN {
            return Err(Error::InvalidPin(format!(
                "GPIO pin must be 0-{MAX_GPIO_PIN}, got {pin}"
            )));
        }
        Ok(PinId(pin))
    }

    /// Create a pin id without validation (for built-in defaults).
    ///
    /// # Safety
    ///
    /// Caller must ensure the pin is at most [`MAX_GPIO_PIN`].
    pub(crate) fn new_unchecked(pin: u8) -> Self {
        debug_assert!(pin <= MAX_GPIO_PIN, "GPIO pin out of range");
        PinId(pin)
    }

    /// Get the raw pin number.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PinId {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        PinId::new(value)
    }
}

impl From<PinId> for u8 {
    fn from(pin: PinId) -> u8 {
        pin.0
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// 7-bit bus address of a heater child board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ChildAddress(u8);

impl ChildAddress {
    /// Create a new child address with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidChildAddress` if the address falls in one of the
    /// reserved ranges (outside 0x08-0x77).
    pub fn new(address: u8) -> Result<Self> {
        if !(MIN_CHILD_ADDRESS..=MAX_CHILD_ADDRESS).contains(&address) {
            return Err(Error::InvalidChildAddress(format!(
                "Address must be 0x{MIN_CHILD_ADDRESS:02X}-0x{MAX_CHILD_ADDRESS:02X}, got 0x{address:02X}"
            )));
        }
        Ok(ChildAddress(address))
    }

    /// Create an address without validation (for built-in defaults).
    pub(crate) fn new_unchecked(address: u8) -> Self {
        debug_assert!(
            (MIN_CHILD_ADDRESS..=MAX_CHILD_ADDRESS).contains(&address),
            "Child address out of range"
        );
        ChildAddress(address)
    }

    /// Get the raw address.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ChildAddress {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        ChildAddress::new(value)
    }
}

impl From<ChildAddress> for u8 {
    fn from(address: ChildAddress) -> u8 {
        address.0
    }
}

impl fmt::Display for ChildAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Signal direction relative to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
}

/// Snapshot of one physical digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalSignal {
    pub pin: PinId,
    pub direction: Direction,
    pub value: bool,
}

impl DigitalSignal {
    #[must_use]
    pub fn input(pin: PinId, value: bool) -> Self {
        Self {
            pin,
            direction: Direction::In,
            value,
        }
    }

    #[must_use]
    pub fn output(pin: PinId, value: bool) -> Self {
        Self {
            pin,
            direction: Direction::Out,
            value,
        }
    }
}

/// Digital inputs read from the press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSignal {
    Start,
    Stop,
    FullStroke,
}

impl InputSignal {
    /// All inputs in configuration order.
    pub const ALL: [InputSignal; 3] = [Self::Start, Self::Stop, Self::FullStroke];

    /// Position of this signal in `input_pins` and in the broadcast frame.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Start => 0,
            Self::Stop => 1,
            Self::FullStroke => 2,
        }
    }
}

impl fmt::Display for InputSignal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::FullStroke => "full_stroke",
        };
        write!(f, "{name}")
    }
}

/// Digital outputs driven to the press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSignal {
    ExtendPress,
    CoolingAir,
    CycleComplete,
    LampFaulted,
}

impl OutputSignal {
    /// All outputs in configuration order.
    pub const ALL: [OutputSignal; 4] = [
        Self::ExtendPress,
        Self::CoolingAir,
        Self::CycleComplete,
        Self::LampFaulted,
    ];

    /// Position of this signal in `output_pins`.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::ExtendPress => 0,
            Self::CoolingAir => 1,
            Self::CycleComplete => 2,
            Self::LampFaulted => 3,
        }
    }
}

impl fmt::Display for OutputSignal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::ExtendPress => "extend_press",
            Self::CoolingAir => "cooling_air",
            Self::CycleComplete => "cycle_complete",
            Self::LampFaulted => "lamp_faulted",
        };
        write!(f, "{name}")
    }
}

/// Status reported by one heater child board for one acquisition cycle.
///
/// A fresh set is produced every cycle; records are superseded, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildStatus {
    /// Bus address the status was read from.
    pub address: ChildAddress,

    /// Heater has reached its press setpoint.
    pub heater_at_setpoint: bool,

    /// Heater has cooled to its release temperature.
    pub heater_at_release: bool,

    /// Heater finished its dwell for the current press cycle.
    pub heater_cycle_complete: bool,

    /// Heater reports a fault (open element, over-temperature, sensor loss).
    pub heater_faulted: bool,

    /// Platen temperature in degrees Celsius, when the board reports one.
    pub temperature_c: Option<f32>,
}

impl ChildStatus {
    /// Create a status with every flag cleared.
    #[must_use]
    pub fn idle(address: ChildAddress) -> Self {
        Self {
            address,
            heater_at_setpoint: false,
            heater_at_release: false,
            heater_cycle_complete: false,
            heater_faulted: false,
            temperature_c: None,
        }
    }

    /// Create a status from its four flags, in
    /// `[at_setpoint, at_release, cycle_complete, faulted]` order.
    #[must_use]
    pub fn from_flags(address: ChildAddress, flags: [bool; 4]) -> Self {
        let [heater_at_setpoint, heater_at_release, heater_cycle_complete, heater_faulted] = flags;
        Self {
            address,
            heater_at_setpoint,
            heater_at_release,
            heater_cycle_complete,
            heater_faulted,
            temperature_c: None,
        }
    }

    /// Attach a temperature reading.
    #[must_use]
    pub fn with_temperature(mut self, temperature_c: f32) -> Self {
        self.temperature_c = Some(temperature_c);
        self
    }

    /// The four flags in `[at_setpoint, at_release, cycle_complete, faulted]` order.
    #[must_use]
    pub fn flags(&self) -> [bool; 4] {
        [
            self.heater_at_setpoint,
            self.heater_at_release,
            self.heater_cycle_complete,
            self.heater_faulted,
        ]
    }
}
