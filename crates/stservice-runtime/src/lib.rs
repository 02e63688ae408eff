//! stservice Runtime - wiring layer for the stservice dispatcher.
//!
//! This crate provides:
//! - Configuration loading and validation (`StConfig`, `ConfigLoader`)
//! - Logging setup driven by that configuration (`LoggingBuilder`)
//! - [`ServiceRuntime`], which applies per-service configuration while
//!   registering services and feeds decoded events to the controller
//!
//! ```ignore
//! use stservice_runtime::ServiceRuntime;
//! use stservice_framework::ServiceRecord;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Loads stservice.toml from the current directory, sets up logging.
//!     let mut runtime = ServiceRuntime::load()?;
//!
//!     runtime.register(ServiceRecord::new("echo", Echo, 1).post_service("audit"))?;
//!     runtime.register(ServiceRecord::new("audit", Audit::default(), -1))?;
//!
//!     for line in std::io::stdin().lines() {
//!         runtime.handle_json(&line?)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Per-service Configuration
//!
//! ```toml
//! [services.echo]
//! priority = 2          # overrides the tier chosen in code
//! post = ["forward"]    # appended after the record's own post-services
//!
//! [services.ping]
//! enabled = false       # never registered
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, LogFormat, LogLevel, LogOutput, LoggingConfig,
    ServiceConfig, StConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::{RuntimeBuilder, RuntimeStats, ServiceRuntime};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
