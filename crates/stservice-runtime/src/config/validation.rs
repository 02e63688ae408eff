//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, ServiceConfig, StConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &StConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;

    for (name, service) in &config.services {
        validate_service_config(name, service)?;
    }

    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter module names cannot be empty"));
    }

    Ok(())
}

/// Validates a single service override.
fn validate_service_config(name: &str, service: &ServiceConfig) -> ConfigResult<()> {
    if name.is_empty() {
        return Err(ConfigError::validation("Service name cannot be empty"));
    }

    if name.contains(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Service name '{name}' cannot contain whitespace"
        )));
    }

    for post in &service.post {
        if post.is_empty() {
            return Err(ConfigError::validation(format!(
                "Service '{name}' lists an empty post-service name"
            )));
        }

        if post == name {
            return Err(ConfigError::validation(format!(
                "Service '{name}' cannot be its own post-service"
            )));
        }
    }

    Ok(())
}
