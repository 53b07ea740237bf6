//! Enum wrappers for hardware dispatch.
//!
//! The traits in [`crate::traits`] return `impl Future`, so they cannot be
//! used as trait objects. These enums give the supervisor one concrete type
//! per device family while leaving room for real drivers next to the mocks.
//!
//! # Examples
//!
//! ```
//! use presslink_hardware::devices::AnyBus;
//! use presslink_hardware::mock::MockBus;
//!
//! let (bus, _handle) = MockBus::new(Vec::new());
//! let any_bus = AnyBus::Mock(bus);
//! ```

use presslink_core::{ChildAddress, ChildStatus, PinId};

use crate::Result;
use crate::mock::{MockBus, MockInputPin, MockOutputPin};
use crate::traits::{BusClient, DigitalInput, DigitalOutput};
use crate::types::{BroadcastFrame, RawBuffer};

/// Enum wrapper for bus dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyBus {
    /// Mock bus for development and testing.
    Mock(MockBus),
}

impl BusClient for AnyBus {
    async fn open(&mut self) -> Result<()> {
        match self {
            Self::Mock(bus) => bus.open().await,
        }
    }

    async fn populate_address_table(&mut self) -> Result<usize> {
        match self {
            Self::Mock(bus) => bus.populate_address_table().await,
        }
    }

    fn addresses(&self) -> &[ChildAddress] {
        match self {
            Self::Mock(bus) => bus.addresses(),
        }
    }

    async fn broadcast(&mut self, frame: &BroadcastFrame) -> Result<()> {
        match self {
            Self::Mock(bus) => bus.broadcast(frame).await,
        }
    }

    async fn read_all(&mut self, buffers: &mut Vec<RawBuffer>) -> Result<()> {
        match self {
            Self::Mock(bus) => bus.read_all(buffers).await,
        }
    }

    fn process_all(&self, buffers: &[RawBuffer]) -> Result<Vec<ChildStatus>> {
        match self {
            Self::Mock(bus) => bus.process_all(buffers),
        }
    }
}

/// Enum wrapper for input line dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyDigitalInput {
    /// Mock input for development and testing.
    Mock(MockInputPin),
}

impl DigitalInput for AnyDigitalInput {
    fn pin(&self) -> PinId {
        match self {
            Self::Mock(input) => input.pin(),
        }
    }

    fn read(&self) -> Result<bool> {
        match self {
            Self::Mock(input) => input.read(),
        }
    }

    async fn wait_for_change(&mut self) -> Result<bool> {
        match self {
            Self::Mock(input) => input.wait_for_change().await,
        }
    }
}

/// Enum wrapper for output line dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyDigitalOutput {
    /// Mock output for development and testing.
    Mock(MockOutputPin),
}

impl DigitalOutput for AnyDigitalOutput {
    fn pin(&self) -> PinId {
        match self {
            Self::Mock(output) => output.pin(),
        }
    }

    fn write(&mut self, level: bool) -> Result<()> {
        match self {
            Self::Mock(output) => output.write(level),
        }
    }
}
