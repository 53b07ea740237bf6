//! Integration tests for the database connection and heater log repository
//!
//! Run with: cargo test --package presslink-storage --test integration_database

use std::sync::Arc;

use presslink_core::{ChildAddress, ChildStatus};
use presslink_storage::connection::{Database, DatabaseConfig};
use presslink_storage::{HeaterLogRepository, SqliteHeaterLogRepository, StorageError};
use tokio::sync::Barrier;

fn addr(a: u8) -> ChildAddress {
    ChildAddress::new(a).unwrap()
}

fn complete_cell() -> Vec<ChildStatus> {
    vec![
        ChildStatus::from_flags(addr(0x10), [true, true, true, false]).with_temperature(181.5),
        ChildStatus::from_flags(addr(0x11), [true, true, true, false]).with_temperature(179.0),
        ChildStatus::from_flags(addr(0x12), [true, true, true, true]),
    ]
}

#[tokio::test]
async fn test_in_memory_database() {
    let db = Database::in_memory().await.unwrap();
    db.health_check().await.unwrap();
    db.close().await;
    assert!(db.is_closed());
}

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='heater_logs'",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();

    assert_eq!(result.0, 1);
    db.close().await;
}

#[tokio::test]
async fn test_record_cycle_writes_one_row_per_child() {
    let db = Database::in_memory().await.unwrap();
    let repo = SqliteHeaterLogRepository::new(db.pool().clone());

    let written = repo.record_cycle(7, &complete_cell()).await.unwrap();
    assert_eq!(written, 3);
    assert_eq!(repo.count().await.unwrap(), 3);

    let rows = repo.find_by_cycle(7).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].address(), Some(addr(0x10)));
    assert_eq!(rows[0].temperature_c, Some(181.5));
    assert!(rows.iter().all(|r| r.cycle_complete));
    assert!(rows[2].faulted);
    assert_eq!(rows[2].temperature_c, None);
    assert!(rows.iter().all(|r| r.recorded_at == rows[0].recorded_at));
}

#[tokio::test]
async fn test_recent_and_find_by_child() {
    let db = Database::in_memory().await.unwrap();
    let repo = SqliteHeaterLogRepository::new(db.pool().clone());

    repo.record_cycle(1, &complete_cell()).await.unwrap();
    repo.record_cycle(2, &complete_cell()).await.unwrap();

    let recent = repo.recent(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent.iter().all(|r| r.cycle_number == 2));

    let child = repo.find_by_child(addr(0x11), 10).await.unwrap();
    assert_eq!(child.len(), 2);
    assert_eq!(child[0].cycle_number, 2);
    assert_eq!(child[1].cycle_number, 1);
}

#[tokio::test]
async fn test_empty_cycle_writes_nothing() {
    let db = Database::in_memory().await.unwrap();
    let repo = SqliteHeaterLogRepository::new(db.pool().clone());

    assert_eq!(repo.record_cycle(1, &[]).await.unwrap(), 0);
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_write_after_close_fails() {
    let db = Database::in_memory().await.unwrap();
    let repo = SqliteHeaterLogRepository::new(db.pool().clone());
    db.close().await;

    let err = repo.record_cycle(1, &complete_cell()).await.unwrap_err();
    assert!(matches!(err, StorageError::Database(_)));
}

#[tokio::test]
async fn test_file_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/nested/press.db", dir.path().display());

    let db = Database::new(DatabaseConfig::new(&url)).await.unwrap();
    SqliteHeaterLogRepository::new(db.pool().clone())
        .record_cycle(3, &complete_cell())
        .await
        .unwrap();
    db.close().await;

    let db = Database::new(DatabaseConfig::new(&url)).await.unwrap();
    let repo = SqliteHeaterLogRepository::new(db.pool().clone());
    assert_eq!(repo.count().await.unwrap(), 3);
    assert_eq!(repo.last_cycle_number().await.unwrap(), 3);
    db.close().await;
}

#[tokio::test]
async fn test_last_cycle_number() {
    let db = Database::in_memory().await.unwrap();
    let repo = SqliteHeaterLogRepository::new(db.pool().clone());
    assert_eq!(repo.last_cycle_number().await.unwrap(), 0);

    repo.record_cycle(12, &complete_cell()).await.unwrap();
    repo.record_cycle(4, &complete_cell()).await.unwrap();
    assert_eq!(repo.last_cycle_number().await.unwrap(), 12);
}

#[tokio::test]
async fn test_concurrent_cycle_writes() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/press.db", dir.path().display());
    let db = Database::new(DatabaseConfig::new(url)).await.unwrap();

    const NUM_CONCURRENT_TASKS: u64 = 8;
    let barrier = Arc::new(Barrier::new(NUM_CONCURRENT_TASKS as usize));

    let handles: Vec<_> = (0..NUM_CONCURRENT_TASKS)
        .map(|cycle| {
            let repo = SqliteHeaterLogRepository::new(db.pool().clone());
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                repo.record_cycle(cycle, &complete_cell()).await
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        assert_eq!(result.unwrap().unwrap(), 3);
    }

    let repo = SqliteHeaterLogRepository::new(db.pool().clone());
    assert_eq!(repo.count().await.unwrap(), 24);
    db.close().await;
}

#[tokio::test]
async fn test_invalid_url_is_configuration_error() {
    let err = Database::new(DatabaseConfig::new("postgres://nope")).await.unwrap_err();
    assert!(matches!(err, StorageError::Configuration(_)));
}
