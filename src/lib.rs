//! Rollcall
//!
//! Event capacity and waitlist management engine. Participants are admitted
//! to events with a fixed capacity, cancellations hand freed slots to the
//! waitlist in registration order, and capacity or status changes to an event
//! are reconciled against its existing registrations, each as one atomic
//! operation against the event store.

pub mod config;
pub mod database;
pub mod ledger;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{RollcallError, Result};

// Re-export main components for easy access
pub use database::{DatabaseService, EventStore, MemoryStore};
pub use ledger::EventLedger;
pub use services::RegistrationEngine;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
