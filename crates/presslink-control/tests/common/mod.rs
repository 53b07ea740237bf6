//! Common test utilities for the control integration tests.
//!
//! [`TestCell`] wires a mock bus, four mock outputs, an in-memory heater log
//! and a [`SharedState`] into an [`AcquisitionCycle`], and keeps the handles
//! tests need to drive and observe them.

#![allow(dead_code)]

use std::sync::Arc;

use presslink_control::{AcquisitionCycle, SharedState};
use presslink_core::{ChildAddress, ChildStatus, PinId};
use presslink_hardware::mock::{MockBus, MockBusHandle, MockOutputHandle, MockOutputPin};
use presslink_hardware::{BusClient, OutputBank, OutputLevels};
use presslink_storage::{Database, SqliteHeaterLogRepository};

pub type TestCycle = AcquisitionCycle<MockBus, SqliteHeaterLogRepository, MockOutputPin>;

pub const T: bool = true;
pub const F: bool = false;

pub fn address(index: usize) -> ChildAddress {
    ChildAddress::new(0x10 + index as u8).unwrap()
}

/// Status records for consecutive addresses starting at 0x10.
pub fn statuses(flags: &[[bool; 4]]) -> Vec<ChildStatus> {
    flags
        .iter()
        .enumerate()
        .map(|(i, f)| ChildStatus::from_flags(address(i), *f))
        .collect()
}

pub struct TestCell {
    pub cycle: TestCycle,
    pub bus: MockBusHandle,
    pub outputs: Vec<MockOutputHandle>,
    pub db: Database,
    pub logs: SqliteHeaterLogRepository,
    pub state: Arc<SharedState>,
}

impl TestCell {
    /// A cell with `children` heaters, bus opened and address table populated.
    pub async fn new(children: usize) -> Self {
        let (mut bus, bus_handle) = MockBus::new((0..children).map(address).collect());
        bus.open().await.unwrap();
        bus.populate_address_table().await.unwrap();

        let (lines, outputs): (Vec<_>, Vec<_>) = [16, 19, 20, 26]
            .into_iter()
            .map(|n| MockOutputPin::new(PinId::new(n).unwrap()))
            .unzip();
        let lines: [MockOutputPin; 4] = lines.try_into().unwrap();

        let db = Database::in_memory().await.unwrap();
        let logs = SqliteHeaterLogRepository::new(db.pool().clone());
        let state = SharedState::new();

        let cycle = AcquisitionCycle::new(
            bus,
            OutputBank::new(lines),
            logs.clone(),
            Arc::clone(&state),
        );

        Self {
            cycle,
            bus: bus_handle,
            outputs,
            db,
            logs,
            state,
        }
    }

    pub fn set_flags(&self, flags: &[[bool; 4]]) {
        self.bus.set_statuses(statuses(flags));
    }

    pub fn mark_ready(&self) {
        let readiness = self.state.readiness();
        readiness.mark_bus_ready();
        readiness.mark_persistence_ready();
        readiness.mark_addresses_mapped();
    }

    /// Current output levels as seen on the lines.
    pub fn output_levels(&self) -> OutputLevels {
        OutputLevels {
            extend_press: self.outputs[0].level(),
            cooling_air: self.outputs[1].level(),
            cycle_complete: self.outputs[2].level(),
            lamp_faulted: self.outputs[3].level(),
        }
    }

    pub fn write_counts(&self) -> Vec<u64> {
        self.outputs.iter().map(MockOutputHandle::write_count).collect()
    }
}
