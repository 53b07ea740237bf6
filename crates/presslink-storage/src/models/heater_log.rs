use chrono::{DateTime, Utc};
use presslink_core::{ChildAddress, ChildStatus};
use serde::{Deserialize, Serialize};

/// One child's heater status captured when a press cycle completed.
///
/// A log entry is written for every child in the address table each time
/// all heaters report cycle complete, so one press cycle produces one row
/// per child sharing the same `cycle_number`.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use presslink_core::{ChildAddress, ChildStatus};
/// use presslink_storage::models::HeaterLog;
///
/// let address = ChildAddress::new(0x10).unwrap();
/// let status = ChildStatus::from_flags(address, [true, true, true, false])
///     .with_temperature(181.5);
///
/// let log = HeaterLog::from_status(42, &status, Utc::now());
///
/// assert_eq!(log.address(), Some(address));
/// assert!(log.cycle_complete);
/// assert_eq!(log.temperature_c, Some(181.5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HeaterLog {
    /// Auto-increment primary key (0 until stored)
    pub id: i64,

    /// Acquisition cycle that issued the log write
    pub cycle_number: i64,

    /// Raw 7-bit bus address of the child
    pub child_address: i64,

    pub at_setpoint: bool,
    pub at_release: bool,
    pub cycle_complete: bool,
    pub faulted: bool,

    /// Platen temperature in degrees Celsius, if reported
    pub temperature_c: Option<f64>,

    pub recorded_at: DateTime<Utc>,
}

impl HeaterLog {
    /// Build an unsaved entry from a status record.
    pub fn from_status(cycle_number: i64, status: &ChildStatus, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            cycle_number,
            child_address: i64::from(status.address.as_u8()),
            at_setpoint: status.heater_at_setpoint,
            at_release: status.heater_at_release,
            cycle_complete: status.heater_cycle_complete,
            faulted: status.heater_faulted,
            // Round-trip through the decimal form so 181.5f32 stays 181.5
            temperature_c: status
                .temperature_c
                .and_then(|t| t.to_string().parse::<f64>().ok()),
            recorded_at,
        }
    }

    /// Typed child address, `None` if the stored value is out of range.
    pub fn address(&self) -> Option<ChildAddress> {
        u8::try_from(self.child_address)
            .ok()
            .and_then(|a| ChildAddress::new(a).ok())
    }
}
