//! Storage layer for the press heater supervisor.
//!
//! This crate provides SQLite-backed persistence for heater log entries: the
//! per-child status snapshot written once each time every heater reports its
//! press cycle complete.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool manager with automatic migrations
//! - [`HeaterLogRepository`] - Data access trait, with the
//!   [`SqliteHeaterLogRepository`] implementation
//!
//! # Examples
//!
//! ```no_run
//! use presslink_core::{ChildAddress, ChildStatus};
//! use presslink_storage::{Database, DatabaseConfig};
//! use presslink_storage::repositories::{HeaterLogRepository, SqliteHeaterLogRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("sqlite://presslink.db")).await?;
//! let logs = SqliteHeaterLogRepository::new(db.pool().clone());
//!
//! let address = ChildAddress::new(0x10)?;
//! let statuses = vec![ChildStatus::from_flags(address, [true, true, true, false])];
//! logs.record_cycle(1, &statuses).await?;
//!
//! for entry in logs.find_by_child(address, 10).await? {
//!     println!("cycle {} at {}", entry.cycle_number, entry.recorded_at);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Performance
//!
//! - WAL mode for file databases
//! - One transaction per logged cycle
//! - Indexed by child address and by cycle number

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::HeaterLog;
pub use repositories::{HeaterLogRepository, SqliteHeaterLogRepository};
