//! Database repositories module
//!
//! This module contains the Postgres repositories for the two relations

pub mod event;
pub mod registration;

// Re-export repositories
pub use event::EventRepository;
pub use registration::RegistrationRepository;
