//! Integration tests for the input watcher
//!
//! These drive mock input lines and check that the shared levels follow them
//! while the watcher tasks run on their own.

use std::sync::Arc;
use std::time::Duration;

use presslink_core::{InputSignal, PinId};
use presslink_hardware::devices::AnyDigitalInput;
use presslink_hardware::mock::{MockInputHandle, MockInputPin};
use presslink_hardware::{InputLevels, InputWatcher};

fn register_all(watcher: &mut InputWatcher) -> Vec<MockInputHandle> {
    InputSignal::ALL
        .iter()
        .zip([5u8, 6, 13])
        .map(|(signal, n)| {
            let (pin, handle) = MockInputPin::new(PinId::new(n).unwrap());
            watcher.register(*signal, AnyDigitalInput::Mock(pin));
            handle
        })
        .collect()
}

async fn wait_for(levels: &InputLevels, expected: [bool; 3]) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while levels.snapshot() != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("levels did not converge");
}

#[tokio::test]
async fn test_levels_follow_inputs() {
    let mut watcher = InputWatcher::new();
    let lines = register_all(&mut watcher);
    let levels = watcher.levels();
    let handle = watcher.start();

    lines[0].set_level(true);
    wait_for(&levels, [true, false, false]).await;

    lines[2].set_level(true);
    wait_for(&levels, [true, false, true]).await;

    lines[0].set_level(false);
    wait_for(&levels, [false, false, true]).await;

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_initial_levels_are_seeded() {
    let levels = Arc::new(InputLevels::new());
    let mut watcher = InputWatcher::with_levels(Arc::clone(&levels));

    let (stop, _stop_line) = MockInputPin::with_level(PinId::new(6).unwrap(), true);
    watcher.register(InputSignal::Stop, AnyDigitalInput::Mock(stop));

    let handle = watcher.start();
    wait_for(&levels, [false, true, false]).await;

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_disconnected_line_ends_its_task_only() {
    let mut watcher = InputWatcher::new();
    let mut lines = register_all(&mut watcher);
    let levels = watcher.levels();
    let handle = watcher.start();
    assert_eq!(handle.task_count(), 3);

    drop(lines.remove(1));
    tokio::task::yield_now().await;

    lines[0].set_level(true);
    wait_for(&levels, [true, false, false]).await;

    handle.shutdown().await.unwrap();
}
