//! Error taxonomy for the supervisor.
//!
//! - Transport failures abort the current cycle before any output write
//! - Persistence failures block startup; during a cycle they are reported
//!   without stopping actuation
//! - Configuration failures are fatal to startup
//!
//! A faulted heater is not an error. It is reported through the lamp-faulted
//! output.

use std::fmt;

use presslink_hardware::HardwareError;
use presslink_storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bus or I/O operation a transport error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    OpenBus,
    PopulateAddresses,
    Broadcast,
    Read,
    Process,
    WriteOutputs,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenBus => "open_bus",
            Self::PopulateAddresses => "populate_addresses",
            Self::Broadcast => "broadcast",
            Self::Read => "read",
            Self::Process => "process",
            Self::WriteOutputs => "write_outputs",
        };
        write!(f, "{name}")
    }
}

/// Coarse classification used by the status board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Persistence,
    Configuration,
    Timeout,
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Transport error during {operation}: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: HardwareError,
    },

    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cycle timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

impl ControlError {
    pub fn transport(operation: Operation, source: HardwareError) -> Self {
        Self::Transport { operation, source }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Whether a startup step failing with this error may be attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Persistence(_) | Self::Timeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display_names_operation() {
        let error = ControlError::transport(Operation::Read, HardwareError::timeout(20));
        assert_eq!(
            error.to_string(),
            "Transport error during read: Operation timeout after 20ms"
        );
        assert_eq!(error.kind(), ErrorKind::Transport);
        assert!(error.is_retryable());
    }

    #[test]
    fn test_configuration_is_not_retryable() {
        let error = ControlError::configuration("address table is empty");
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert!(!error.is_retryable());
    }
}
