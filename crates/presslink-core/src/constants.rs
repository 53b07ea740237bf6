//! Core constants for the heater cell supervisor.
//!
//! Defaults here mirror the wiring of the reference press cell: three
//! digital inputs coming from the press PLC, four digital outputs going back
//! to it, and a handful of heater child boards on a shared two-wire bus.
//!
//! # Pin Layout
//!
//! | Signal | Direction | Default GPIO |
//! |--------|-----------|--------------|
//! | Start | In | 5 |
//! | Stop | In | 6 |
//! | Full stroke | In | 13 |
//! | Extend press | Out | 16 |
//! | Cooling air | Out | 19 |
//! | Cycle complete | Out | 20 |
//! | Lamp faulted | Out | 26 |
//!
//! # Usage
//!
//! ```
//! use presslink_core::constants::*;
//!
//! assert_eq!(DEFAULT_INPUT_PINS.len(), INPUT_SIGNAL_COUNT);
//! assert_eq!(DEFAULT_OUTPUT_PINS.len(), OUTPUT_SIGNAL_COUNT);
//! assert!(DEFAULT_CYCLE_PERIOD_MS > 0);
//! ```

// ============================================================================
// Digital I/O
// ============================================================================

/// Number of digital inputs read from the press (start, stop, full stroke).
pub const INPUT_SIGNAL_COUNT: usize = 3;

/// Number of digital outputs driven to the press.
pub const OUTPUT_SIGNAL_COUNT: usize = 4;

/// Highest usable GPIO line on the supervisor header.
pub const MAX_GPIO_PIN: u8 = 27;

/// Default input pins, in `[start, stop, full_stroke]` order.
pub const DEFAULT_INPUT_PINS: [u8; INPUT_SIGNAL_COUNT] = [5, 6, 13];

/// Default output pins, in `[extend_press, cooling_air, cycle_complete, lamp_faulted]` order.
pub const DEFAULT_OUTPUT_PINS: [u8; OUTPUT_SIGNAL_COUNT] = [16, 19, 20, 26];

// ============================================================================
// Child Bus Addressing
// ============================================================================

/// Lowest non-reserved 7-bit bus address.
///
/// Addresses 0x00-0x07 are reserved for general call and bus control.
pub const MIN_CHILD_ADDRESS: u8 = 0x08;

/// Highest non-reserved 7-bit bus address.
///
/// Addresses 0x78-0x7F are reserved for 10-bit addressing.
pub const MAX_CHILD_ADDRESS: u8 = 0x77;

/// Child addresses used when no address table is configured.
pub const DEFAULT_CHILD_ADDRESSES: [u8; 3] = [0x10, 0x11, 0x12];

// ============================================================================
// Timing
// ============================================================================

/// Default acquisition cadence in milliseconds.
pub const DEFAULT_CYCLE_PERIOD_MS: u64 = 50;

/// Default watchdog for a single acquisition cycle in milliseconds.
///
/// A cycle still running after this long is cancelled, recorded as failed and
/// the cycle guard is released so the scheduler can continue.
pub const DEFAULT_CYCLE_TIMEOUT_MS: u64 = 1000;

/// Default interval between status log lines in milliseconds.
pub const DEFAULT_STATUS_INTERVAL_MS: u64 = 5000;

/// Default number of attempts per startup step (1 means no retry).
pub const DEFAULT_INIT_ATTEMPTS: u32 = 1;

/// Default pause between startup attempts in milliseconds.
pub const DEFAULT_INIT_BACKOFF_MS: u64 = 500;

// ============================================================================
// Persistence
// ============================================================================

/// Default persistence URL.
pub const DEFAULT_PERSISTENCE_URL: &str = "sqlite://presslink.db";
