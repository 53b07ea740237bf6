use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use presslink_core::ControllerConfig;

#[derive(Parser, Debug)]
#[command(name = "presslink")]
#[command(about = "Heater cell supervisor for a hot press", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Acquisition cadence, overriding the configuration file
    #[arg(long)]
    pub cycle_period_ms: Option<u64>,

    /// Persistence URL, overriding the configuration file
    #[arg(long)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the supervisor against the simulated press cell (default)
    Run,

    /// Print the most recent heater log entries as JSON lines
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
}

impl Cli {
    /// Configuration file (or defaults) with command-line overrides applied.
    pub fn load_config(&self) -> anyhow::Result<ControllerConfig> {
        let mut config = match &self.config {
            Some(path) => ControllerConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => ControllerConfig::default(),
        };

        if let Some(period_ms) = self.cycle_period_ms {
            config = config.with_cycle_period_ms(period_ms);
        }
        if let Some(url) = &self.database_url {
            config = config.with_persistence_url(url.clone());
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "presslink",
            "--cycle-period-ms",
            "20",
            "--database-url",
            "sqlite::memory:",
        ]);
        let config = cli.load_config().unwrap();

        assert_eq!(config.cycle_period_ms, 20);
        assert_eq!(config.persistence_url, "sqlite::memory:");
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_zero_period_rejected() {
        let cli = Cli::parse_from(["presslink", "--cycle-period-ms", "0"]);
        assert!(cli.load_config().is_err());
    }

    #[test]
    fn test_history_subcommand() {
        let cli = Cli::parse_from(["presslink", "history", "--limit", "5"]);
        assert_eq!(cli.command, Some(Command::History { limit: 5 }));
    }
}
