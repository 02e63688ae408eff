//! Error types shared by services and the dispatch layer.
//!
//! Reaction operations have no failure channel at all: a service always
//! answers with a [`Reply`](crate::Reply). The only fallible step in a
//! service's life is its one-time [`init`](crate::Service::init), which
//! reports a [`ServiceError`].

use thiserror::Error;

/// A type-erased error, used when a service wraps a third-party failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Service Errors
// =============================================================================

/// Errors a service may raise from its one-time setup.
///
/// The controller never translates these; they are handed back to whoever
/// called `register`.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Setup failed for a service-specific reason.
    #[error("service init failed: {reason}")]
    Init {
        /// Human-readable reason.
        reason: String,
    },

    /// I/O failure while opening a resource.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure.
    #[error(transparent)]
    Other(BoxError),
}

impl ServiceError {
    /// Creates an init error with the given reason.
    pub fn init(reason: impl Into<String>) -> Self {
        Self::Init {
            reason: reason.into(),
        }
    }

    /// Wraps an arbitrary error.
    pub fn other(err: impl Into<BoxError>) -> Self {
        Self::Other(err.into())
    }
}

/// Result type for service setup.
pub type ServiceResult<T = ()> = Result<T, ServiceError>;

// =============================================================================
// Event Errors
// =============================================================================

/// Errors that can occur while decoding a raw event payload.
#[derive(Debug, Error)]
pub enum EventError {
    /// The payload is not valid JSON or does not match the message schema.
    #[error("failed to decode event: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload has no `post_type` field.
    #[error("event payload has no post_type")]
    MissingPostType,
}

/// Result type for event decoding.
pub type EventResult<T> = Result<T, EventError>;
