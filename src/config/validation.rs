//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{RollcallError, Result};
use super::{Settings, StorageBackend};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.storage.backend == StorageBackend::Postgres {
        validate_database_config(&settings.database)?;
    }
    validate_logging_config(&settings.logging)?;
    validate_registration_config(&settings.registration)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(RollcallError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(RollcallError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(RollcallError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    if config.acquire_timeout_seconds == 0 {
        return Err(RollcallError::Config(
            "Acquire timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(RollcallError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(RollcallError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    if matches!(config.directory.as_deref(), Some("")) {
        return Err(RollcallError::Config(
            "Log directory cannot be empty when set".to_string()
        ));
    }

    Ok(())
}

/// Validate registration defaults
fn validate_registration_config(config: &super::RegistrationConfig) -> Result<()> {
    if config.upcoming_limit <= 0 {
        return Err(RollcallError::Config(
            "Upcoming event limit must be greater than 0".to_string()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_memory_backend_skips_database_checks() {
        let mut settings = Settings::default();
        settings.database.url = String::new();
        assert_matches!(validate_settings(&settings), Err(RollcallError::Config(_)));

        settings.storage.backend = StorageBackend::Memory;
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_connection_bounds() {
        let mut settings = Settings::default();
        settings.database.min_connections = 20;
        assert_matches!(
            validate_settings(&settings),
            Err(RollcallError::Config(msg)) if msg.contains("Min connections")
        );
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        assert_matches!(
            validate_settings(&settings),
            Err(RollcallError::Config(msg)) if msg.contains("Invalid log level")
        );
    }

    #[test]
    fn test_upcoming_limit_must_be_positive() {
        let mut settings = Settings::default();
        settings.registration.upcoming_limit = 0;
        assert!(validate_settings(&settings).is_err());
    }
}
