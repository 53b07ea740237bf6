//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be controlled
//! programmatically without requiring physical hardware.

pub mod bus;
pub mod gpio;

// Re-export commonly used types
pub use bus::{MockBus, MockBusHandle};
pub use gpio::{MockInputHandle, MockInputPin, MockOutputHandle, MockOutputPin};
