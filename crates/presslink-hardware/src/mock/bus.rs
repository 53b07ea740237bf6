//! Mock child bus for testing and development.
//!
//! The mock keeps one [`ChildStatus`] per address behind a shared lock. Tests
//! and the simulated press cell update those records through a
//! [`MockBusHandle`], and can inject delays, hangs and failures.
//!
//! # Buffer Layout
//!
//! Each child answers with three bytes:
//!
//! | Byte | Content |
//! |------|---------|
//! | 0 | flags: bit 0 at setpoint, bit 1 at release, bit 2 cycle complete, bit 3 faulted |
//! | 1-2 | platen temperature, big-endian `i16`, tenths of a degree (`i16::MIN` = none) |

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use parking_lot::Mutex;
use presslink_core::{ChildAddress, ChildStatus, constants::DEFAULT_CHILD_ADDRESSES};
use tracing::{debug, trace};

use crate::{
    BusClient, HardwareError, Result,
    types::{BroadcastFrame, RawBuffer},
};

/// Broadcast frames kept for inspection; older frames are discarded.
pub const BROADCAST_HISTORY: usize = 256;

/// Length of one encoded status buffer.
pub const STATUS_BUFFER_LEN: usize = 3;

const FLAG_AT_SETPOINT: u8 = 0b0001;
const FLAG_AT_RELEASE: u8 = 0b0010;
const FLAG_CYCLE_COMPLETE: u8 = 0b0100;
const FLAG_FAULTED: u8 = 0b1000;
const NO_TEMPERATURE: i16 = i16::MIN;

/// Encode a status record into its three-byte buffer.
pub fn encode_status(status: &ChildStatus) -> Bytes {
    let mut flags = 0u8;
    if status.heater_at_setpoint {
        flags |= FLAG_AT_SETPOINT;
    }
    if status.heater_at_release {
        flags |= FLAG_AT_RELEASE;
    }
    if status.heater_cycle_complete {
        flags |= FLAG_CYCLE_COMPLETE;
    }
    if status.heater_faulted {
        flags |= FLAG_FAULTED;
    }

    let tenths = status.temperature_c.map_or(NO_TEMPERATURE, |t| {
        (t * 10.0).round().clamp(f32::from(i16::MIN + 1), f32::from(i16::MAX)) as i16
    });

    let mut buf = BytesMut::with_capacity(STATUS_BUFFER_LEN);
    buf.put_u8(flags);
    buf.put_i16(tenths);
    buf.freeze()
}

/// Decode a three-byte buffer into a status record.
///
/// # Errors
/// Returns `HardwareError::InvalidData` for a short buffer or unknown flag bits.
pub fn decode_status(buffer: &RawBuffer) -> Result<ChildStatus> {
    if buffer.bytes.len() != STATUS_BUFFER_LEN {
        return Err(HardwareError::invalid_data(
            buffer.address,
            format!(
                "expected {STATUS_BUFFER_LEN} bytes, got {}",
                buffer.bytes.len()
            ),
        ));
    }

    let mut bytes = buffer.bytes.clone();
    let flags = bytes.get_u8();
    if flags & !0b1111 != 0 {
        return Err(HardwareError::invalid_data(
            buffer.address,
            format!("unknown flag bits 0x{flags:02X}"),
        ));
    }

    let mut status = ChildStatus::from_flags(
        buffer.address,
        [
            flags & FLAG_AT_SETPOINT != 0,
            flags & FLAG_AT_RELEASE != 0,
            flags & FLAG_CYCLE_COMPLETE != 0,
            flags & FLAG_FAULTED != 0,
        ],
    );

    let tenths = bytes.get_i16();
    if tenths != NO_TEMPERATURE {
        status = status.with_temperature(f32::from(tenths) / 10.0);
    }

    Ok(status)
}

#[derive(Debug, Default)]
struct MockBusState {
    statuses: HashMap<ChildAddress, ChildStatus>,
    read_delay: Duration,
    hang_reads: bool,
    fail_reads: bool,
    fail_broadcasts: bool,
    failing_opens: u32,
    corrupt: Option<ChildAddress>,
    broadcasts: VecDeque<BroadcastFrame>,
    broadcast_count: u64,
    read_count: u64,
}

/// Mock bus for testing and development.
///
/// # Examples
///
/// ```
/// use presslink_core::{ChildAddress, ChildStatus};
/// use presslink_hardware::mock::MockBus;
/// use presslink_hardware::{BroadcastFrame, BusClient};
///
/// #[tokio::main]
/// async fn main() -> presslink_hardware::Result<()> {
///     let address = ChildAddress::new(0x10).unwrap();
///     let (mut bus, handle) = MockBus::new(vec![address]);
///
///     handle.set_status(ChildStatus::from_flags(address, [true, false, false, false]));
///
///     bus.open().await?;
///     assert_eq!(bus.populate_address_table().await?, 1);
///
///     let mut buffers = Vec::new();
///     bus.broadcast(&BroadcastFrame::default()).await?;
///     bus.read_all(&mut buffers).await?;
///     let statuses = bus.process_all(&buffers)?;
///
///     assert!(statuses[0].heater_at_setpoint);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockBus {
    name: String,
    configured: Vec<ChildAddress>,
    table: Vec<ChildAddress>,
    open: bool,
    shared: Arc<Mutex<MockBusState>>,
}

impl MockBus {
    /// Create a mock bus presenting `addresses` with the default name.
    pub fn new(addresses: Vec<ChildAddress>) -> (Self, MockBusHandle) {
        Self::with_name("mock-i2c".to_string(), addresses)
    }

    /// Create a mock bus with a custom name.
    pub fn with_name(name: String, addresses: Vec<ChildAddress>) -> (Self, MockBusHandle) {
        let shared = Arc::new(Mutex::new(MockBusState::default()));

        let bus = Self {
            name,
            configured: addresses,
            table: Vec::new(),
            open: false,
            shared: Arc::clone(&shared),
        };

        (bus, MockBusHandle { shared })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(HardwareError::not_open(&self.name))
        }
    }
}

impl Default for MockBus {
    fn default() -> Self {
        let addresses = DEFAULT_CHILD_ADDRESSES
            .into_iter()
            .filter_map(|a| ChildAddress::new(a).ok())
            .collect();
        Self::new(addresses).0
    }
}

impl BusClient for MockBus {
    async fn open(&mut self) -> Result<()> {
        {
            let mut state = self.shared.lock();
            if state.failing_opens > 0 {
                state.failing_opens -= 1;
                return Err(HardwareError::initialization_failed(format!(
                    "{}: bus open failed",
                    self.name
                )));
            }
        }

        self.open = true;
        debug!(bus = %self.name, "Mock bus opened");
        Ok(())
    }

    async fn populate_address_table(&mut self) -> Result<usize> {
        self.ensure_open()?;
        self.table = self.configured.clone();
        Ok(self.table.len())
    }

    fn addresses(&self) -> &[ChildAddress] {
        &self.table
    }

    async fn broadcast(&mut self, frame: &BroadcastFrame) -> Result<()> {
        self.ensure_open()?;

        let mut state = self.shared.lock();
        if state.fail_broadcasts {
            return Err(HardwareError::communication(format!(
                "{}: broadcast failed",
                self.name
            )));
        }
        if state.broadcasts.len() == BROADCAST_HISTORY {
            state.broadcasts.pop_front();
        }
        state.broadcasts.push_back(*frame);
        state.broadcast_count += 1;
        trace!(bus = %self.name, frame = ?frame.as_array(), "Broadcast");
        Ok(())
    }

    async fn read_all(&mut self, buffers: &mut Vec<RawBuffer>) -> Result<()> {
        self.ensure_open()?;

        let (delay, hang) = {
            let state = self.shared.lock();
            (state.read_delay, state.hang_reads)
        };

        if hang {
            std::future::pending::<()>().await;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.shared.lock();
        state.read_count += 1;
        if state.fail_reads {
            return Err(HardwareError::communication(format!(
                "{}: read failed",
                self.name
            )));
        }

        buffers.clear();
        for address in &self.table {
            let bytes = if state.corrupt == Some(*address) {
                Bytes::from_static(&[0xFF])
            } else {
                let status = state
                    .statuses
                    .get(address)
                    .cloned()
                    .unwrap_or_else(|| ChildStatus::idle(*address));
                encode_status(&status)
            };
            buffers.push(RawBuffer::new(*address, bytes));
        }

        Ok(())
    }

    fn process_all(&self, buffers: &[RawBuffer]) -> Result<Vec<ChildStatus>> {
        buffers.iter().map(decode_status).collect()
    }
}

/// Handle for controlling a mock bus.
///
/// Cloneable; every clone controls the same bus.
#[derive(Debug, Clone)]
pub struct MockBusHandle {
    shared: Arc<Mutex<MockBusState>>,
}

impl MockBusHandle {
    /// Set the status a child will report from the next read on.
    pub fn set_status(&self, status: ChildStatus) {
        self.shared.lock().statuses.insert(status.address, status);
    }

    /// Replace the status of several children at once.
    pub fn set_statuses(&self, statuses: impl IntoIterator<Item = ChildStatus>) {
        let mut state = self.shared.lock();
        for status in statuses {
            state.statuses.insert(status.address, status);
        }
    }

    /// Status a child is currently set to report.
    pub fn status(&self, address: ChildAddress) -> Option<ChildStatus> {
        self.shared.lock().statuses.get(&address).cloned()
    }

    /// Delay every read by `delay`.
    pub fn set_read_delay(&self, delay: Duration) {
        self.shared.lock().read_delay = delay;
    }

    /// Make reads never complete.
    pub fn set_hang_reads(&self, hang: bool) {
        self.shared.lock().hang_reads = hang;
    }

    /// Make reads fail with a communication error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.shared.lock().fail_reads = fail;
    }

    /// Make broadcasts fail with a communication error.
    pub fn set_fail_broadcasts(&self, fail: bool) {
        self.shared.lock().fail_broadcasts = fail;
    }

    /// Make the next `count` calls to `open` fail.
    pub fn fail_next_opens(&self, count: u32) {
        self.shared.lock().failing_opens = count;
    }

    /// Make one child answer with an undecodable buffer.
    pub fn corrupt_child(&self, address: Option<ChildAddress>) {
        self.shared.lock().corrupt = address;
    }

    /// The most recent frames, oldest first, up to [`BROADCAST_HISTORY`].
    pub fn broadcasts(&self) -> Vec<BroadcastFrame> {
        self.shared.lock().broadcasts.iter().copied().collect()
    }

    /// The most recent broadcast frame.
    pub fn last_broadcast(&self) -> Option<BroadcastFrame> {
        self.shared.lock().broadcasts.back().copied()
    }

    /// Total frames broadcast, including those no longer kept.
    pub fn broadcast_count(&self) -> u64 {
        self.shared.lock().broadcast_count
    }

    /// Number of read rounds attempted.
    pub fn read_count(&self) -> u64 {
        self.shared.lock().read_count
    }
}
