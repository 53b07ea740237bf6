//! Supervisor configuration.
//!
//! Every field has a default matching the reference press cell, so an empty
//! TOML document is a valid configuration:
//!
//! ```
//! use presslink_core::ControllerConfig;
//!
//! let config = ControllerConfig::from_toml_str("").unwrap();
//! assert_eq!(config.cycle_period_ms, 50);
//!
//! let config = ControllerConfig::from_toml_str(
//!     r#"
//!     input_pins = [5, 6, 13]
//!     output_pins = [16, 19, 20, 26]
//!     cycle_period_ms = 100
//!     persistence_url = "sqlite://press-line-2.db"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.cycle_period_ms, 100);
//! ```

use crate::{
    ChildAddress, InputSignal, OutputSignal, PinId, Result,
    constants::{
        DEFAULT_CHILD_ADDRESSES, DEFAULT_CYCLE_PERIOD_MS, DEFAULT_CYCLE_TIMEOUT_MS,
        DEFAULT_INIT_ATTEMPTS, DEFAULT_INIT_BACKOFF_MS, DEFAULT_INPUT_PINS, DEFAULT_OUTPUT_PINS,
        DEFAULT_PERSISTENCE_URL, DEFAULT_STATUS_INTERVAL_MS, INPUT_SIGNAL_COUNT,
        OUTPUT_SIGNAL_COUNT,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// Runtime configuration for the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Input pins in `[start, stop, full_stroke]` order.
    pub input_pins: [PinId; INPUT_SIGNAL_COUNT],

    /// Output pins in `[extend_press, cooling_air, cycle_complete, lamp_faulted]` order.
    pub output_pins: [PinId; OUTPUT_SIGNAL_COUNT],

    /// Acquisition cadence in milliseconds.
    pub cycle_period_ms: u64,

    /// Persistence backend URL (e.g. `sqlite://presslink.db`).
    pub persistence_url: String,

    /// Watchdog for one acquisition cycle in milliseconds.
    pub cycle_timeout_ms: u64,

    /// Child addresses presented by the simulated bus.
    pub child_addresses: Vec<ChildAddress>,

    /// Attempts per startup step. `1` disables retry.
    pub init_attempts: u32,

    /// Pause between startup attempts in milliseconds.
    pub init_backoff_ms: u64,

    /// Interval between status log lines in milliseconds.
    pub status_interval_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            input_pins: DEFAULT_INPUT_PINS.map(PinId::new_unchecked),
            output_pins: DEFAULT_OUTPUT_PINS.map(PinId::new_unchecked),
            cycle_period_ms: DEFAULT_CYCLE_PERIOD_MS,
            persistence_url: DEFAULT_PERSISTENCE_URL.to_string(),
            cycle_timeout_ms: DEFAULT_CYCLE_TIMEOUT_MS,
            child_addresses: DEFAULT_CHILD_ADDRESSES
                .into_iter()
                .map(ChildAddress::new_unchecked)
                .collect(),
            init_attempts: DEFAULT_INIT_ATTEMPTS,
            init_backoff_ms: DEFAULT_INIT_BACKOFF_MS,
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
        }
    }
}

impl ControllerConfig {
    /// Load and validate a TOML configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate a TOML configuration document.
    ///
    /// # Errors
    /// Returns an error if the document is not valid TOML or fails
    /// [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Override the acquisition cadence.
    #[must_use]
    pub fn with_cycle_period_ms(mut self, period_ms: u64) -> Self {
        self.cycle_period_ms = period_ms;
        self
    }

    /// Override the persistence URL.
    #[must_use]
    pub fn with_persistence_url(mut self, url: impl Into<String>) -> Self {
        self.persistence_url = url.into();
        self
    }

    /// Check the configuration for wiring and timing mistakes.
    ///
    /// # Errors
    /// Returns:
    /// - `Error::DuplicatePin` if two signals share a pin
    /// - `Error::Config` for a zero period, timeout or status interval, zero
    ///   init attempts, an empty persistence URL, or a duplicated child address
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashMap<PinId, String> = HashMap::new();
        let named_pins = InputSignal::ALL
            .iter()
            .map(|s| (self.input_pin(*s), s.to_string()))
            .chain(
                OutputSignal::ALL
                    .iter()
                    .map(|s| (self.output_pin(*s), s.to_string())),
            );

        for (pin, name) in named_pins {
            if let Some(first) = seen.get(&pin) {
                return Err(Error::DuplicatePin {
                    pin: pin.as_u8(),
                    first: first.clone(),
                    second: name,
                });
            }
            seen.insert(pin, name);
        }

        if self.cycle_period_ms == 0 {
            return Err(Error::Config("cycle_period_ms must be greater than 0".into()));
        }
        if self.cycle_timeout_ms == 0 {
            return Err(Error::Config("cycle_timeout_ms must be greater than 0".into()));
        }
        if self.status_interval_ms == 0 {
            return Err(Error::Config("status_interval_ms must be greater than 0".into()));
        }
        if self.init_attempts == 0 {
            return Err(Error::Config("init_attempts must be at least 1".into()));
        }
        if self.persistence_url.trim().is_empty() {
            return Err(Error::Config("persistence_url must not be empty".into()));
        }

        let mut addresses = HashSet::new();
        for address in &self.child_addresses {
            if !addresses.insert(*address) {
                return Err(Error::Config(format!(
                    "child address {address} listed more than once"
                )));
            }
        }

        Ok(())
    }

    /// Pin assigned to an input signal.
    #[must_use]
    pub fn input_pin(&self, signal: InputSignal) -> PinId {
        self.input_pins[signal.index()]
    }

    /// Pin assigned to an output signal.
    #[must_use]
    pub fn output_pin(&self, signal: OutputSignal) -> PinId {
        self.output_pins[signal.index()]
    }

    pub fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.cycle_period_ms)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_millis(self.cycle_timeout_ms)
    }

    pub fn init_backoff(&self) -> Duration {
        Duration::from_millis(self.init_backoff_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }
}
