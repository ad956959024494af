//! Core error types

use thiserror::Error;

/// Core error type for tmesh
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration is present but unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// A hashname could not be parsed
    #[error("Invalid hashname: {0}")]
    InvalidHashname(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML decoding error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
