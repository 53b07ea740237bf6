#![allow(async_fn_in_trait)]

use std::future::Future;

use crate::error::{StorageError, StorageResult};
use crate::models::HeaterLog;
use chrono::Utc;
use presslink_core::{ChildAddress, ChildStatus};
use sqlx::SqlitePool;
use tracing::debug;

/// Repository trait for heater log entries
///
/// `record_cycle` is called from inside the acquisition cycle, which runs on
/// a spawned task, so its future is declared `Send`.
pub trait HeaterLogRepository: Send + Sync {
    /// Store one entry per status record, atomically, and return how many
    /// rows were written
    fn record_cycle(
        &self,
        cycle_number: u64,
        statuses: &[ChildStatus],
    ) -> impl Future<Output = StorageResult<usize>> + Send;

    /// Most recent entries, newest first
    async fn recent(&self, limit: i64) -> StorageResult<Vec<HeaterLog>>;

    /// Most recent entries for one child, newest first
    async fn find_by_child(&self, address: ChildAddress, limit: i64)
    -> StorageResult<Vec<HeaterLog>>;

    /// All entries written for one cycle, in address order
    async fn find_by_cycle(&self, cycle_number: u64) -> StorageResult<Vec<HeaterLog>>;

    /// Total number of stored entries
    async fn count(&self) -> StorageResult<i64>;

    /// Highest cycle number stored, or 0 for an empty log
    async fn last_cycle_number(&self) -> StorageResult<u64>;
}

/// SQLite implementation of HeaterLogRepository
#[derive(Debug, Clone)]
pub struct SqliteHeaterLogRepository {
    pool: SqlitePool,
}

impl SqliteHeaterLogRepository {
    /// Create a new SQLite heater log repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn cycle_number_to_i64(cycle_number: u64) -> StorageResult<i64> {
    i64::try_from(cycle_number).map_err(|_| {
        StorageError::Validation(format!("cycle number {cycle_number} exceeds storage range"))
    })
}

impl HeaterLogRepository for SqliteHeaterLogRepository {
    async fn record_cycle(&self, cycle_number: u64, statuses: &[ChildStatus]) -> StorageResult<usize> {
        let cycle_number = cycle_number_to_i64(cycle_number)?;
        let recorded_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        for status in statuses {
            let log = HeaterLog::from_status(cycle_number, status, recorded_at);
            sqlx::query(
                r#"
                INSERT INTO heater_logs (
                    cycle_number, child_address, at_setpoint, at_release,
                    cycle_complete, faulted, temperature_c, recorded_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(log.cycle_number)
            .bind(log.child_address)
            .bind(log.at_setpoint)
            .bind(log.at_release)
            .bind(log.cycle_complete)
            .bind(log.faulted)
            .bind(log.temperature_c)
            .bind(log.recorded_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(cycle_number, rows = statuses.len(), "Heater log written");
        Ok(statuses.len())
    }

    async fn recent(&self, limit: i64) -> StorageResult<Vec<HeaterLog>> {
        let logs = sqlx::query_as::<_, HeaterLog>(
            r#"
            SELECT id, cycle_number, child_address, at_setpoint, at_release,
                   cycle_complete, faulted, temperature_c, recorded_at
            FROM heater_logs
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_by_child(
        &self,
        address: ChildAddress,
        limit: i64,
    ) -> StorageResult<Vec<HeaterLog>> {
        let logs = sqlx::query_as::<_, HeaterLog>(
            r#"
            SELECT id, cycle_number, child_address, at_setpoint, at_release,
                   cycle_complete, faulted, temperature_c, recorded_at
            FROM heater_logs
            WHERE child_address = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(address.as_u8()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_by_cycle(&self, cycle_number: u64) -> StorageResult<Vec<HeaterLog>> {
        let logs = sqlx::query_as::<_, HeaterLog>(
            r#"
            SELECT id, cycle_number, child_address, at_setpoint, at_release,
                   cycle_complete, faulted, temperature_c, recorded_at
            FROM heater_logs
            WHERE cycle_number = ?
            ORDER BY child_address ASC
            "#,
        )
        .bind(cycle_number_to_i64(cycle_number)?)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn count(&self) -> StorageResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM heater_logs")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn last_cycle_number(&self) -> StorageResult<u64> {
        let (last,): (i64,) =
            sqlx::query_as("SELECT COALESCE(MAX(cycle_number), 0) FROM heater_logs")
                .fetch_one(&self.pool)
                .await?;

        u64::try_from(last)
            .map_err(|_| StorageError::Validation(format!("stored cycle number {last} is negative")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_number_range() {
        assert_eq!(cycle_number_to_i64(7).unwrap(), 7);
        assert!(matches!(
            cycle_number_to_i64(u64::MAX),
            Err(StorageError::Validation(_))
        ));
    }
}
