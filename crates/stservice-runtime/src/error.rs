//! Runtime error types.

use stservice_core::{EventError, ServiceError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A service with this name is already registered.
    #[error("Service already registered: {0}")]
    DuplicateService(String),

    /// A service failed its one-time setup.
    #[error("Service '{name}' failed to initialize: {source}")]
    ServiceInit {
        /// Name of the failing service.
        name: String,
        /// The error raised by the service.
        #[source]
        source: ServiceError,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A raw event could not be decoded.
    #[error("Event error: {0}")]
    Event(#[from] EventError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
