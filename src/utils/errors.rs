//! Error handling for Rollcall
//!
//! This module defines the error taxonomy returned by the registration engine.
//! Business-rule violations are expected outcomes that callers turn into
//! user-facing messages; storage failures roll back the attempted operation.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{EventStatus, RegistrationStatus};

/// Main error type for Rollcall
#[derive(Error, Debug)]
pub enum RollcallError {
    #[error("User {user_id} is already registered for event {event_id}")]
    AlreadyRegistered { event_id: Uuid, user_id: i64 },

    #[error("Event {event_id} is not open for registration (status: {status})")]
    EventNotOpen { event_id: Uuid, status: EventStatus },

    #[error("Event {event_id} has reached maximum capacity ({capacity})")]
    CapacityFull { event_id: Uuid, capacity: i32 },

    #[error("No active registration for user {user_id} on event {event_id}")]
    NoActiveRegistration { event_id: Uuid, user_id: i64 },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Capacity {requested} is below the {active} active registrations")]
    CapacityBelowDemand { requested: i32, active: i64 },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: Uuid },

    #[error("Registration not found: {registration_id}")]
    RegistrationNotFound { registration_id: Uuid },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: RegistrationStatus, to: RegistrationStatus },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for Rollcall operations
pub type Result<T> = std::result::Result<T, RollcallError>;

impl From<config::ConfigError> for RollcallError {
    fn from(err: config::ConfigError) -> Self {
        RollcallError::Config(err.to_string())
    }
}

impl RollcallError {
    /// Whether the error is one of the registration rules rather than an
    /// infrastructure failure
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            RollcallError::AlreadyRegistered { .. }
                | RollcallError::EventNotOpen { .. }
                | RollcallError::CapacityFull { .. }
                | RollcallError::NoActiveRegistration { .. }
                | RollcallError::PermissionDenied(_)
                | RollcallError::CapacityBelowDemand { .. }
        )
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            RollcallError::Storage(err) => matches!(
                err,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)
            ),
            RollcallError::Migration(_) => false,
            RollcallError::Config(_) => false,
            _ => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RollcallError::Storage(_) => ErrorSeverity::Critical,
            RollcallError::Migration(_) => ErrorSeverity::Critical,
            RollcallError::Config(_) => ErrorSeverity::Critical,
            RollcallError::PermissionDenied(_) => ErrorSeverity::Warning,
            RollcallError::InvalidStatusTransition { .. } => ErrorSeverity::Warning,
            RollcallError::InvalidInput(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Info,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rules_are_classified() {
        let event_id = Uuid::new_v4();
        let full = RollcallError::CapacityFull { event_id, capacity: 2 };
        assert!(full.is_business_rule());
        assert!(full.is_recoverable());
        assert_eq!(full.severity(), ErrorSeverity::Info);

        let denied = RollcallError::PermissionDenied("not the owner".to_string());
        assert!(denied.is_business_rule());
        assert_eq!(denied.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_storage_failure_is_critical() {
        let err = RollcallError::from(sqlx::Error::RowNotFound);
        assert!(!err.is_business_rule());
        assert!(!err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.to_string().starts_with("Storage failure"));
    }

    #[test]
    fn test_pool_timeout_is_recoverable() {
        let err = RollcallError::from(sqlx::Error::PoolTimedOut);
        assert!(!err.is_business_rule());
        assert!(err.is_recoverable());

        let err = RollcallError::InvalidInput("limit must be positive".to_string());
        assert!(err.is_recoverable());
        assert!(!RollcallError::Config("missing url".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = RollcallError::CapacityBelowDemand { requested: 1, active: 3 };
        assert_eq!(err.to_string(), "Capacity 1 is below the 3 active registrations");

        let err = RollcallError::InvalidStatusTransition {
            from: RegistrationStatus::Waitlisted,
            to: RegistrationStatus::Pending,
        };
        assert_eq!(err.to_string(), "Invalid status transition: waitlisted -> pending");
    }
}
