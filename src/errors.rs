// src/errors.rs

//! Crate-wide error type and its mapping onto gRPC status codes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpiceError {
    /// Missing or malformed request fields, unregistered flavour, unsafe input
    /// path, empty netlisting result.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// `spawn` called on a runner that already owns a live child.
    #[error("Process already running: {0}")]
    AlreadyRunning(String),

    /// The OS ran out of pipes, descriptors or process slots.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// A request shape that is not wired end-to-end on this server.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<SpiceError> for tonic::Status {
    fn from(err: SpiceError) -> Self {
        let message = err.to_string();
        match err {
            SpiceError::InvalidArgument(_) => tonic::Status::invalid_argument(message),
            SpiceError::AlreadyRunning(_) => tonic::Status::failed_precondition(message),
            SpiceError::ResourceExhausted(_) => tonic::Status::resource_exhausted(message),
            SpiceError::Unimplemented(_) => tonic::Status::unimplemented(message),
            _ => tonic::Status::internal(message),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SpiceError>;
