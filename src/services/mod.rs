//! Services module
//!
//! This module contains the registration engine: participant operations in
//! `registration`, owner-side event lifecycle operations in `lifecycle`.

pub mod lifecycle;
pub mod registration;

pub use registration::RegistrationEngine;
