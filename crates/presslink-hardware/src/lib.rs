//! Hardware abstraction layer for the press heater supervisor.
//!
//! This crate defines the contracts the supervisor consumes from the outside
//! world, plus mock implementations for development and testing:
//!
//! - [`BusClient`]: the shared bus reaching the heater child boards
//!   (broadcast, read, decode, address table population)
//! - [`DigitalInput`] / [`DigitalOutput`]: the press I/O lines
//! - [`OutputBank`]: the four outputs written as a batch
//! - [`InputWatcher`](watcher::InputWatcher): keeps [`InputLevels`] in step
//!   with the input lines, independently of the acquisition cycle
//!
//! # Examples
//!
//! ```
//! use presslink_core::{ChildAddress, ChildStatus};
//! use presslink_hardware::devices::AnyBus;
//! use presslink_hardware::mock::MockBus;
//! use presslink_hardware::{BroadcastFrame, BusClient};
//!
//! #[tokio::main]
//! async fn main() -> presslink_hardware::Result<()> {
//!     let address = ChildAddress::new(0x10).unwrap();
//!     let (bus, handle) = MockBus::new(vec![address]);
//!     let mut bus = AnyBus::Mock(bus);
//!
//!     handle.set_status(ChildStatus::from_flags(address, [true, true, true, false]));
//!
//!     bus.open().await?;
//!     bus.populate_address_table().await?;
//!
//!     let mut buffers = Vec::new();
//!     bus.broadcast(&BroadcastFrame::default()).await?;
//!     bus.read_all(&mut buffers).await?;
//!     let statuses = bus.process_all(&buffers)?;
//!
//!     assert!(statuses[0].heater_cycle_complete);
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] with a
//! [`HardwareError`]. The supervisor treats every one of them as a transport
//! failure.

pub mod devices;
pub mod error;
pub mod mock;
pub mod outputs;
pub mod traits;
pub mod types;
pub mod watcher;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use outputs::OutputBank;
pub use traits::{BusClient, DigitalInput, DigitalOutput};
pub use types::{BroadcastFrame, OutputLevels, RawBuffer};
pub use watcher::{InputLevels, InputWatcher, WatcherHandle};
