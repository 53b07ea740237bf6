use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Addressing errors
    #[error("Invalid pin: {0}")]
    InvalidPin(String),

    #[error("Invalid child address: {0}")]
    InvalidChildAddress(String),

    #[error("Duplicate pin {pin} assigned to {first} and {second}")]
    DuplicatePin {
        pin: u8,
        first: String,
        second: String,
    },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
