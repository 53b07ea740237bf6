//! Supervisory control for the press heater cell.
//!
//! Every period the scheduler starts one acquisition cycle, unless the system
//! is not ready or a cycle is still in flight. The cycle broadcasts the press
//! inputs to the heater child boards, reads their status, aggregates it, and
//! latches the result onto the four press outputs. When every heater reports
//! its press cycle complete, one heater log entry is written per rising edge.
//!
//! # Modules
//!
//! - [`aggregator`]: reduces child status records to four conditions
//! - [`latch`]: output mapping and the edge-triggered log request
//! - [`cycle`]: the staged acquisition cycle
//! - [`scheduler`]: periodic ticks, the cycle runner, and shutdown
//! - [`initializer`]: startup sequence and readiness
//! - [`state`] / [`status`]: shared flags, counters and status reports
//!
//! # Examples
//!
//! ```no_run
//! use presslink_control::scheduler::{self, SchedulerConfig};
//! use presslink_control::{AcquisitionCycle, Initializer, SharedState};
//! use presslink_core::ChildAddress;
//! use presslink_hardware::{OutputBank, mock::{MockBus, MockOutputPin}};
//! use presslink_core::PinId;
//! use presslink_storage::{DatabaseConfig, SqliteHeaterLogRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = SharedState::new();
//! let (mut bus, _bus_handle) = MockBus::new(vec![ChildAddress::new(0x10)?]);
//!
//! let db = Initializer::default()
//!     .run(&mut bus, &DatabaseConfig::new("sqlite::memory:"), state.readiness())
//!     .await?;
//!
//! let lines = [16, 19, 20, 26].map(|n| MockOutputPin::new(PinId::new(n).unwrap()).0);
//! let logs = SqliteHeaterLogRepository::new(db.pool().clone());
//! let cycle = AcquisitionCycle::new(bus, OutputBank::new(lines), logs, state.clone());
//!
//! let handle = scheduler::spawn(cycle, state, SchedulerConfig::default());
//! tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod cycle;
pub mod error;
pub mod initializer;
pub mod latch;
pub mod scheduler;
pub mod state;
pub mod status;

pub use aggregator::{Aggregate, aggregate};
pub use cycle::{AcquisitionCycle, CycleReport, LogWrite};
pub use error::{ControlError, ErrorKind, Operation, Result};
pub use initializer::{Initializer, StartupStep};
pub use latch::{LatchDecision, OutputLatch};
pub use scheduler::{SchedulerConfig, SchedulerHandle, TickOutcome};
pub use state::{CycleGuard, SharedState, SystemReadiness};
pub use status::{CycleOutcome, StatusBoard, StatusReport};
