//! Hardware trait definitions.
//!
//! These traits are the contract between the supervisor and the physical
//! world: the two-wire bus that reaches the heater child boards, and the
//! digital lines wired to the press.
//!
//! Async methods are declared as `fn -> impl Future + Send` so that generic
//! code (the cycle runner, the input watcher) can be handed to
//! `tokio::spawn`. Implementations may still be written with `async fn`.

use std::future::Future;

use presslink_core::{ChildAddress, ChildStatus, PinId};

use crate::error::Result;
use crate::types::{BroadcastFrame, RawBuffer};

/// Client for the bus shared by the heater child boards.
///
/// # Call order
///
/// 1. [`open`](Self::open) once at startup
/// 2. [`populate_address_table`](Self::populate_address_table) once at startup
/// 3. Every cycle: [`broadcast`](Self::broadcast), [`read_all`](Self::read_all),
///    [`process_all`](Self::process_all)
///
/// # Examples
///
/// ```
/// use presslink_hardware::{BusClient, BroadcastFrame, RawBuffer, Result};
/// use presslink_core::ChildStatus;
///
/// async fn poll_once<B: BusClient>(bus: &mut B) -> Result<Vec<ChildStatus>> {
///     let mut buffers: Vec<RawBuffer> = Vec::new();
///     bus.broadcast(&BroadcastFrame::default()).await?;
///     bus.read_all(&mut buffers).await?;
///     bus.process_all(&buffers)
/// }
/// ```
pub trait BusClient: Send {
    /// Open the bus transport.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Discover or load the child address table and return its size.
    fn populate_address_table(&mut self) -> impl Future<Output = Result<usize>> + Send;

    /// Addresses in the table, in polling order.
    fn addresses(&self) -> &[ChildAddress];

    /// Send the current input levels and the datalogging flag to every child.
    fn broadcast(&mut self, frame: &BroadcastFrame) -> impl Future<Output = Result<()>> + Send;

    /// Read one raw status buffer per child into `buffers`.
    ///
    /// `buffers` is cleared first so it can be reused across cycles.
    fn read_all(&mut self, buffers: &mut Vec<RawBuffer>)
    -> impl Future<Output = Result<()>> + Send;

    /// Decode raw buffers into one status record per child.
    ///
    /// # Errors
    /// Returns `HardwareError::InvalidData` if a buffer cannot be decoded.
    fn process_all(&self, buffers: &[RawBuffer]) -> Result<Vec<ChildStatus>>;
}

/// A digital input line.
pub trait DigitalInput: Send {
    /// Pin this line is attached to.
    fn pin(&self) -> PinId;

    /// Current level of the line.
    fn read(&self) -> Result<bool>;

    /// Wait until the level changes and return the new level.
    fn wait_for_change(&mut self) -> impl Future<Output = Result<bool>> + Send;
}

/// A digital output line.
///
/// Writes are synchronous so a batch of writes cannot be interrupted halfway
/// by task cancellation.
pub trait DigitalOutput: Send {
    /// Pin this line is attached to.
    fn pin(&self) -> PinId;

    /// Drive the line to `level`.
    fn write(&mut self, level: bool) -> Result<()>;
}
