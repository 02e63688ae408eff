//! Service runtime.
//!
//! [`ServiceRuntime`] sits between a transport and the [`Controller`]: it
//! loads configuration, sets up logging, applies per-service overrides while
//! services are registered, and turns raw OneBot payloads into dispatches.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use stservice_runtime::ServiceRuntime;
//!
//! // Auto-loads stservice.toml from the current directory
//! let mut runtime = ServiceRuntime::load()?;
//!
//! // Custom configuration path
//! let mut runtime = ServiceRuntime::builder()
//!     .config_file("config/stservice.toml")
//!     .profile("production")
//!     .build()?;
//! ```

use std::path::PathBuf;

use tracing::{debug, info, trace};

use stservice_core::MessageEvent;
use stservice_framework::{Controller, DispatchStatus, ServiceRecord};

use crate::config::{ConfigLoader, StConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Owns the controller and the configuration it is wired from.
pub struct ServiceRuntime {
    /// The configuration.
    config: StConfig,
    /// The controller all services are registered into.
    controller: Controller,
}

impl ServiceRuntime {
    /// Loads configuration from the default locations and builds a runtime.
    pub fn load() -> RuntimeResult<Self> {
        Self::builder().build()
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Validates the configuration and initializes logging from it (a
    /// subscriber installed earlier is left in place).
    pub fn from_config(config: StConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            configured_services = config.services.len(),
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config,
            controller: Controller::new(),
        })
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &StConfig {
        &self.config
    }

    /// Returns the controller.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Consumes the runtime, keeping only the populated controller.
    pub fn into_controller(self) -> Controller {
        self.controller
    }

    /// Registers a service, applying its configured overrides.
    ///
    /// Returns `Ok(false)` if the configuration disables the service, in
    /// which case it is dropped without running `init`.
    ///
    /// # Errors
    ///
    /// - [`RuntimeError::DuplicateService`] if the name is taken
    /// - [`RuntimeError::ServiceInit`] if the service's `init` fails; the
    ///   service stays registered under its name
    pub fn register(&mut self, record: ServiceRecord) -> RuntimeResult<bool> {
        let name = record.name().to_string();

        let record = match self.config.service(&name) {
            Some(overrides) if !overrides.enabled => {
                info!(service = %name, "Service disabled by configuration, skipping");
                return Ok(false);
            }
            Some(overrides) => {
                let mut record = record;
                if let Some(priority) = overrides.priority {
                    debug!(
                        service = %name,
                        from = record.priority(),
                        to = priority,
                        "Priority overridden by configuration"
                    );
                    record = record.with_priority(priority);
                }
                record.post_services(overrides.post.iter().cloned())
            }
            None => record,
        };

        match self.controller.register(record) {
            Ok(true) => Ok(true),
            Ok(false) => Err(RuntimeError::DuplicateService(name)),
            Err(source) => Err(RuntimeError::ServiceInit { name, source }),
        }
    }

    /// Dispatches a decoded message.
    pub fn handle_event(&self, event: &MessageEvent) -> DispatchStatus {
        trace!(kind = %event.kind(), text = event.text(), "Handling event");
        self.controller.dispatch(event)
    }

    /// Decodes a raw OneBot payload and dispatches it.
    ///
    /// Returns `Ok(None)` for payloads that are not message events.
    pub fn handle_json(&self, raw: &str) -> RuntimeResult<Option<DispatchStatus>> {
        Ok(MessageEvent::from_json(raw)?.map(|event| self.handle_event(&event)))
    }

    /// Returns statistics about the registered services.
    pub fn stats(&self) -> RuntimeStats {
        let mut stats = RuntimeStats {
            services: self.controller.len(),
            ..Default::default()
        };

        for tier in self.controller.tiers() {
            let count = self.controller.names_at(tier).len();
            if tier < 0 {
                stats.post_only += count;
            } else {
                stats.tiers += 1;
            }
        }

        stats
    }
}

impl std::fmt::Debug for ServiceRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRuntime")
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

/// Statistics about the services registered in a runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Total number of registered services.
    pub services: usize,
    /// Number of primary (non-negative) tiers.
    pub tiers: usize,
    /// Number of services only reachable as post-services.
    pub post_only: usize,
}

impl std::fmt::Display for RuntimeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Services: {} total across {} tier(s), {} post-only",
            self.services, self.tiers, self.post_only
        )
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`ServiceRuntime`] with custom configuration sources.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_file: Option<PathBuf>,
    profile: Option<String>,
    without_env: bool,
    defaults: Option<StConfig>,
}

impl RuntimeBuilder {
    /// Creates a builder that searches the default locations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads this file instead of searching for one.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Selects the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Ignores `STSERVICE_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.without_env = true;
        self
    }

    /// Replaces the built-in defaults with `config`.
    ///
    /// Configuration files and `STSERVICE_*` variables still override it.
    pub fn defaults(mut self, config: StConfig) -> Self {
        self.defaults = Some(config);
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> RuntimeResult<ServiceRuntime> {
        let mut loader = ConfigLoader::new();

        if let Some(defaults) = self.defaults {
            loader = loader.merge(defaults);
        }

        if let Some(profile) = self.profile {
            loader = loader.profile(profile);
        }
        if self.without_env {
            loader = loader.without_env();
        }
        loader = match self.config_file {
            Some(path) => loader.file(path),
            None => loader.with_current_dir().with_user_config_dir(),
        };

        ServiceRuntime::from_config(loader.load()?)
    }
}
