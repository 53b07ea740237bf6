//! End-to-end acquisition cycles against mock hardware and an in-memory log.

mod common;

use common::{F, T, TestCell, address};
use presslink_control::{ControlError, LogWrite, Operation};
use presslink_hardware::OutputLevels;
use presslink_storage::HeaterLogRepository;
use rstest::rstest;

#[tokio::test]
async fn test_all_heaters_complete() {
    let mut cell = TestCell::new(3).await;
    cell.set_flags(&[[T, T, T, F], [T, T, T, F], [T, T, T, F]]);

    let report = cell.cycle.run().await.unwrap();

    assert_eq!(
        cell.output_levels(),
        OutputLevels {
            extend_press: true,
            cooling_air: true,
            cycle_complete: true,
            lamp_faulted: false,
        }
    );
    assert!(report.decision.datalogging_requested);
    assert!(cell.cycle.latch().datalogging_pending());
    assert_eq!(cell.write_counts(), vec![1, 1, 1, 1]);
}

#[tokio::test]
async fn test_mixed_heaters_with_fault() {
    let mut cell = TestCell::new(3).await;
    cell.set_flags(&[[T, T, T, F], [T, F, T, F], [T, T, T, T]]);

    cell.cycle.run().await.unwrap();

    assert_eq!(
        cell.output_levels(),
        OutputLevels {
            extend_press: true,
            cooling_air: false,
            cycle_complete: true,
            lamp_faulted: true,
        }
    );
    assert_eq!(cell.write_counts(), vec![1, 1, 1, 1]);
}

#[rstest]
#[case::heating(&[[F, F, F, F], [F, F, F, F]], [F, F, F, F])]
#[case::one_at_setpoint(&[[T, F, F, F], [F, F, F, F]], [F, F, F, F])]
#[case::pressing(&[[T, F, F, F], [T, F, F, F]], [T, F, F, F])]
#[case::cooling(&[[F, T, F, F], [F, T, F, F]], [F, T, F, F])]
#[case::faulted_idle(&[[F, F, F, T], [F, F, F, F]], [F, F, F, T])]
#[tokio::test]
async fn test_output_mapping(#[case] flags: &[[bool; 4]], #[case] expected: [bool; 4]) {
    let mut cell = TestCell::new(flags.len()).await;
    cell.set_flags(flags);

    cell.cycle.run().await.unwrap();

    assert_eq!(cell.output_levels().as_array(), expected);
}

#[tokio::test]
async fn test_outputs_rewritten_every_cycle() {
    let mut cell = TestCell::new(2).await;
    cell.set_flags(&[[T, F, F, F], [T, F, F, F]]);

    for _ in 0..5 {
        cell.cycle.run().await.unwrap();
    }

    assert_eq!(cell.write_counts(), vec![5, 5, 5, 5]);
}

#[tokio::test]
async fn test_one_log_entry_per_rising_edge() {
    let mut cell = TestCell::new(2).await;

    // false, true, true, true, false
    let sequence = [F, T, T, T, F];
    for complete in sequence {
        cell.set_flags(&[[F, F, complete, F], [F, F, complete, F]]);
        cell.cycle.run().await.unwrap();
    }

    // The request raised on cycle 2 is broadcast and logged on cycle 3
    let frames = cell.bus.broadcasts();
    let flagged: Vec<_> = frames.iter().map(|f| f.datalogging).collect();
    assert_eq!(flagged, vec![F, F, T, F, F]);

    assert_eq!(cell.logs.count().await.unwrap(), 2);
    let rows = cell.logs.find_by_cycle(3).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.cycle_complete));

    assert!(!cell.cycle.latch().log_request_sent());
    assert_eq!(cell.state.status().log_entries_written(), 2);
}

#[tokio::test]
async fn test_second_edge_logs_again() {
    let mut cell = TestCell::new(1).await;

    for complete in [T, T, F, T, T] {
        cell.set_flags(&[[F, F, complete, F]]);
        cell.cycle.run().await.unwrap();
    }

    let cycles: Vec<_> = cell
        .logs
        .recent(10)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.cycle_number)
        .collect();
    assert_eq!(cycles, vec![5, 2]);
}

#[tokio::test]
async fn test_log_failure_does_not_stop_actuation() {
    let mut cell = TestCell::new(2).await;
    cell.set_flags(&[[T, T, T, F], [T, T, T, F]]);

    cell.cycle.run().await.unwrap();
    cell.db.close().await;

    let report = cell.cycle.run().await.unwrap();

    assert!(matches!(report.log_write, LogWrite::Failed(_)));
    assert_eq!(cell.write_counts(), vec![2, 2, 2, 2]);
    assert!(cell.output_levels().cycle_complete);
    assert!(cell.cycle.latch().log_request_sent());
    assert_eq!(cell.state.status().log_failures(), 1);

    // No retry on the following cycle
    let report = cell.cycle.run().await.unwrap();
    assert_eq!(report.log_write, LogWrite::NotRequested);
}

#[tokio::test]
async fn test_read_failure_aborts_before_writes() {
    let mut cell = TestCell::new(2).await;
    cell.set_flags(&[[T, T, T, F], [T, T, T, F]]);
    cell.bus.set_fail_reads(true);

    let err = cell.cycle.run().await.unwrap_err();

    assert!(matches!(
        err,
        ControlError::Transport {
            operation: Operation::Read,
            ..
        }
    ));
    assert_eq!(cell.write_counts(), vec![0, 0, 0, 0]);
    assert!(!cell.cycle.latch().datalogging_pending());
}

#[tokio::test]
async fn test_broadcast_failure_aborts_cycle() {
    let mut cell = TestCell::new(1).await;
    cell.bus.set_fail_broadcasts(true);

    let err = cell.cycle.run().await.unwrap_err();

    assert!(matches!(
        err,
        ControlError::Transport {
            operation: Operation::Broadcast,
            ..
        }
    ));
    assert_eq!(cell.bus.read_count(), 0);
    assert_eq!(cell.write_counts(), vec![0, 0, 0, 0]);
}

#[tokio::test]
async fn test_pending_request_survives_failed_cycle() {
    let mut cell = TestCell::new(1).await;
    cell.set_flags(&[[F, F, T, F]]);

    cell.cycle.run().await.unwrap();
    assert!(cell.cycle.latch().datalogging_pending());

    cell.bus.set_fail_reads(true);
    assert!(cell.cycle.run().await.is_err());
    assert!(cell.cycle.latch().datalogging_pending());

    cell.bus.set_fail_reads(false);
    let report = cell.cycle.run().await.unwrap();
    assert_eq!(report.log_write, LogWrite::Written(1));
    assert_eq!(cell.logs.find_by_child(address(0), 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_output_write_failure_fails_cycle() {
    let mut cell = TestCell::new(1).await;
    cell.set_flags(&[[T, T, F, F]]);
    cell.outputs[2].set_fail(true);

    let err = cell.cycle.run().await.unwrap_err();

    assert!(matches!(
        err,
        ControlError::Transport {
            operation: Operation::WriteOutputs,
            ..
        }
    ));
    // The remaining lines were still written
    assert_eq!(cell.write_counts(), vec![1, 1, 0, 1]);
}
