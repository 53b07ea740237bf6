//! Error types for bus and digital I/O operations.
//!
//! Every failure surfaced here is a transport failure from the supervisor's
//! point of view: the acquisition cycle aborts before touching the outputs and
//! the startup sequence stays unready.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while talking to the bus or the GPIO lines.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Bus used before `open` succeeded.
    #[error("Bus not open: {device}")]
    NotOpen { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Bus or pin communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Malformed status buffer received from a child board.
    #[error("Invalid data from {address}: {message}")]
    InvalidData { address: String, message: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Write to an output line failed.
    #[error("Write to {pin} failed: {message}")]
    WriteFailed { pin: String, message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new not-open error.
    pub fn not_open(device: impl Into<String>) -> Self {
        Self::NotOpen {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error for a child address.
    pub fn invalid_data(address: impl ToString, message: impl Into<String>) -> Self {
        Self::InvalidData {
            address: address.to_string(),
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new output write error.
    pub fn write_failed(pin: impl ToString, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            pin: pin.to_string(),
            message: message.into(),
        }
    }
}
