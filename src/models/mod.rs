//! Data models module
//!
//! This module contains the event and registration records and the
//! read models built from them

pub mod event;
pub mod registration;

// Re-export commonly used models
pub use event::{Event, EventStatus, CreateEventRequest, UpdateEventRequest, EventSummary, RegisteredEvent};
pub use registration::{Registration, RegistrationStatus, PendingRegistration, Cancellation, Reconciliation};
