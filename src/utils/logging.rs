//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the registration engine.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use uuid::Uuid;

use crate::config::{LogFormat, LoggingConfig};
use crate::models::RegistrationStatus;
use crate::utils::errors::{Result, RollcallError};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer when dropped; keep it alive for
/// the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let stdout_layer = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .boxed(),
    };

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let file_appender = tracing_appender::rolling::daily(directory, "rollcall.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| RollcallError::Config(format!("Failed to initialize logging: {}", err)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log registration actions with structured data
pub fn log_registration_action(event_id: Uuid, user_id: i64, action: &str, status: RegistrationStatus) {
    info!(
        event_id = %event_id,
        user_id = user_id,
        action = action,
        status = %status,
        "Registration action performed"
    );
}

/// Log event management actions
pub fn log_event_action(event_id: Uuid, action: &str, user_id: i64, details: Option<&str>) {
    info!(
        event_id = %event_id,
        action = action,
        user_id = user_id,
        details = details,
        "Event action performed"
    );
}

/// Log the registration changes a lifecycle change caused
pub fn log_reconciliation(event_id: Uuid, trigger: &str, promoted: usize, cancelled: usize) {
    if promoted == 0 && cancelled == 0 {
        debug!(event_id = %event_id, trigger = trigger, "Reconciliation changed no registrations");
    } else {
        info!(
            event_id = %event_id,
            trigger = trigger,
            promoted = promoted,
            cancelled = cancelled,
            "Registrations reconciled"
        );
    }
}

/// Log a rejected operation. Business-rule rejections are routine, other
/// recoverable failures warn, everything else is an error.
pub fn log_rejection(operation: &str, error: &RollcallError) {
    if error.is_business_rule() {
        info!(operation = operation, reason = %error, "Operation rejected");
    } else if error.is_recoverable() {
        warn!(operation = operation, error = %error, severity = %error.severity(), "Operation failed");
    } else {
        error!(operation = operation, error = %error, severity = %error.severity(), "Operation failed");
    }
}

/// Log store operations
pub fn log_store_operation(operation: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            duration_ms = duration_ms,
            "Store operation completed"
        );
    } else {
        error!(
            operation = operation,
            duration_ms = duration_ms,
            "Store operation failed"
        );
    }
}
