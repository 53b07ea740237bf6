mod cli;
mod simulate;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use presslink_control::scheduler::{self, SchedulerConfig};
use presslink_control::{AcquisitionCycle, Initializer, SharedState};
use presslink_core::{ControllerConfig, InputSignal, OutputSignal};
use presslink_hardware::devices::{AnyBus, AnyDigitalInput, AnyDigitalOutput};
use presslink_hardware::mock::{MockBus, MockInputPin, MockOutputPin};
use presslink_hardware::{InputWatcher, OutputBank};
use presslink_storage::{Database, DatabaseConfig, HeaterLogRepository, SqliteHeaterLogRepository};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use simulate::SimulatedCell;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = cli.load_config()?;

    match cli.command.clone().unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::History { limit } => history(&config, limit).await,
    }
}

async fn run(config: ControllerConfig) -> anyhow::Result<()> {
    info!(
        version = presslink_core::VERSION,
        period_ms = config.cycle_period_ms,
        children = config.child_addresses.len(),
        "Starting presslink"
    );

    let state = SharedState::new();

    let (bus, bus_handle) = MockBus::new(config.child_addresses.clone());
    let mut bus = AnyBus::Mock(bus);

    let mut watcher = InputWatcher::with_levels(state.inputs());
    let mut input_handles = Vec::with_capacity(InputSignal::ALL.len());
    for signal in InputSignal::ALL {
        let (pin, handle) = MockInputPin::new(config.input_pin(signal));
        watcher.register(signal, AnyDigitalInput::Mock(pin));
        input_handles.push(handle);
    }

    let pins = OutputSignal::ALL.map(|signal| MockOutputPin::new(config.output_pin(signal)));
    let output_handles = pins.each_ref().map(|(_, handle)| handle.clone());
    let mut outputs = OutputBank::new(pins.map(|(pin, _)| AnyDigitalOutput::Mock(pin)));

    let db = match Initializer::from_config(&config)
        .run(
            &mut bus,
            &DatabaseConfig::new(config.persistence_url.clone()),
            state.readiness(),
        )
        .await
    {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, kind = ?e.kind(), "Startup failed, supervisor idle with outputs low");
            if let Err(e) = outputs.drive_low() {
                error!(error = %e, "Failed to drive outputs low");
            }
            supervise(&state, config.status_interval(), shutdown_signal()).await;
            log_status(&state);
            info!("Stopped");
            return Ok(());
        }
    };

    let watcher = watcher.start();

    let logs = SqliteHeaterLogRepository::new(db.pool().clone());
    let last_cycle = match logs.last_cycle_number().await {
        Ok(last) => last,
        Err(e) => {
            warn!(error = %e, "Could not read last cycle number, numbering from 1");
            0
        }
    };
    info!(last_cycle, "Heater log opened");

    let cycle =
        AcquisitionCycle::new(bus, outputs, logs, Arc::clone(&state)).starting_after(last_cycle);
    let handle = scheduler::spawn(cycle, Arc::clone(&state), SchedulerConfig::from_config(&config));

    let cell = SimulatedCell::new(
        bus_handle,
        config.child_addresses.clone(),
        input_handles[InputSignal::Start.index()].clone(),
        input_handles[InputSignal::FullStroke.index()].clone(),
        output_handles[OutputSignal::ExtendPress.index()].clone(),
        config.cycle_period() * 2,
    );
    let simulation = tokio::spawn(cell.run(handle.cancellation_token()));

    supervise(&state, config.status_interval(), shutdown_signal()).await;

    handle.shutdown().await;
    if let Err(e) = simulation.await {
        error!(error = %e, "Simulation task failed");
    }
    watcher.shutdown().await?;

    log_status(&state);
    db.close().await;
    info!("Stopped");
    Ok(())
}

/// Log the status report every `interval` until `shutdown` completes.
async fn supervise(state: &SharedState, interval: Duration, shutdown: impl Future<Output = ()>) {
    let mut status_interval = tokio::time::interval(interval);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            _ = status_interval.tick() => log_status(state),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for ctrl-c");
    }
}

fn log_status(state: &SharedState) {
    let report = state.report();
    info!(
        ready = report.ready,
        completed = report.cycles_completed,
        failed = report.cycles_failed,
        timed_out = report.cycles_timed_out,
        dropped_busy = report.ticks_dropped_busy,
        log_entries = report.log_entries_written,
        "Status"
    );

    match serde_json::to_string(&report) {
        Ok(json) => debug!(status = %json, "Status report"),
        Err(e) => error!(error = %e, "Failed to serialize status report"),
    }
}

async fn history(config: &ControllerConfig, limit: i64) -> anyhow::Result<()> {
    let db = Database::new(DatabaseConfig::new(config.persistence_url.clone()))
        .await
        .with_context(|| format!("failed to open {}", config.persistence_url))?;
    let logs = SqliteHeaterLogRepository::new(db.pool().clone());

    for entry in logs.recent(limit).await? {
        println!("{}", serde_json::to_string(&entry)?);
    }

    db.close().await;
    Ok(())
}
