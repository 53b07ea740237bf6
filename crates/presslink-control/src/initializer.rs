//! Startup sequence.
//!
//! Runs the three startup steps in order, marking readiness after each:
//!
//! 1. open the bus (`bus_ready`)
//! 2. connect persistence (`persistence_ready`)
//! 3. populate the child address table (`addresses_mapped`)
//!
//! A failing step stops the sequence and leaves the system not ready, so the
//! scheduler never starts a cycle. Transport and persistence failures may be
//! retried; an empty address table is a configuration error and is not.

use std::fmt;
use std::time::Duration;

use presslink_core::ControllerConfig;
use presslink_hardware::BusClient;
use presslink_storage::{Database, DatabaseConfig};
use tracing::{error, info, warn};

use crate::error::{ControlError, Operation, Result};
use crate::state::SystemReadiness;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStep {
    OpenBus,
    ConnectPersistence,
    PopulateAddresses,
}

impl fmt::Display for StartupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenBus => "open_bus",
            Self::ConnectPersistence => "connect_persistence",
            Self::PopulateAddresses => "populate_addresses",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Initializer {
    attempts: u32,
    backoff: Duration,
}

impl Default for Initializer {
    /// Single attempt per step.
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

impl Initializer {
    /// `attempts` is clamped to at least one.
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.init_attempts, config.init_backoff())
    }

    /// Run every startup step and return the connected database.
    ///
    /// # Errors
    /// Returns the error of the first step that failed on its last attempt.
    pub async fn run<B: BusClient>(
        &self,
        bus: &mut B,
        database: &DatabaseConfig,
        readiness: &SystemReadiness,
    ) -> Result<Database> {
        self.attempt(StartupStep::OpenBus, async || {
            bus.open()
                .await
                .map_err(|e| ControlError::transport(Operation::OpenBus, e))
        })
        .await?;
        readiness.mark_bus_ready();

        let db = self
            .attempt(StartupStep::ConnectPersistence, async || {
                Ok(Database::new(database.clone()).await?)
            })
            .await?;
        readiness.mark_persistence_ready();

        let children = self
            .attempt(StartupStep::PopulateAddresses, async || {
                let count = bus
                    .populate_address_table()
                    .await
                    .map_err(|e| ControlError::transport(Operation::PopulateAddresses, e))?;
                if count == 0 {
                    return Err(ControlError::configuration("child address table is empty"));
                }
                Ok(count)
            })
            .await?;
        readiness.mark_addresses_mapped();

        info!(children, "System ready");
        Ok(db)
    }

    async fn attempt<T>(
        &self,
        step: StartupStep,
        mut action: impl AsyncFnMut() -> Result<T>,
    ) -> Result<T> {
        let mut attempt = 1;

        loop {
            match action().await {
                Ok(value) => {
                    info!(%step, attempt, "Startup step complete");
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    warn!(
                        %step,
                        attempt,
                        max_attempts = self.attempts,
                        error = %e,
                        "Startup step failed, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(%step, attempt, error = %e, "Startup step failed");
                    return Err(e);
                }
            }
        }
    }
}
