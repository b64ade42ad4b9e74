//! Database module
//!
//! This module handles the event store: the storage trait the engine runs
//! against, the Postgres implementation and the in-process one

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{DatabasePool, create_pool, run_migrations, health_check};
pub use memory::MemoryStore;
pub use repositories::{EventRepository, RegistrationRepository};
pub use service::DatabaseService;
pub use store::EventStore;
