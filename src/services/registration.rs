//! Registration engine
//!
//! The engine is the entry point request handlers call with an already
//! authenticated user id. Every mutating operation is a single
//! [`EventStore::transact`] call, so the admission decision, the write and
//! any promotion it triggers commit together or not at all.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::config::RegistrationConfig;
use crate::database::EventStore;
use crate::models::{Cancellation, PendingRegistration, Registration, RegistrationStatus};
use crate::utils::errors::{Result, RollcallError};
use crate::utils::logging::{log_registration_action, log_rejection};

/// Registration engine over an event store
#[derive(Debug, Clone)]
pub struct RegistrationEngine<S> {
    pub(super) store: S,
    pub(super) settings: RegistrationConfig,
}

impl<S: EventStore> RegistrationEngine<S> {
    /// Create a new engine that owns a handle to `store`
    pub fn new(store: S, settings: RegistrationConfig) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register `user_id` for a published event.
    ///
    /// With free capacity the registration is `pending`. A full event puts
    /// the user on the waitlist when `wants_waitlist` is set and fails with
    /// `CapacityFull` otherwise.
    pub async fn register(&self, event_id: Uuid, user_id: i64, wants_waitlist: bool) -> Result<Registration> {
        debug!(event_id = %event_id, user_id = user_id, wants_waitlist = wants_waitlist, "Registering user for event");

        let registration = self
            .store
            .transact(event_id, |ledger| ledger.register(user_id, wants_waitlist, Utc::now()))
            .await
            .inspect_err(|err| log_rejection("register", err))?;

        log_registration_action(event_id, user_id, "registered", registration.status);
        Ok(registration)
    }

    /// Cancel the caller's own registration, promoting the head of the
    /// waitlist into a freed slot within the same transaction
    pub async fn cancel(&self, event_id: Uuid, user_id: i64) -> Result<Cancellation> {
        debug!(event_id = %event_id, user_id = user_id, "Cancelling registration");

        let outcome = self
            .store
            .transact(event_id, |ledger| ledger.cancel(user_id))
            .await
            .inspect_err(|err| log_rejection("cancel", err))?;

        log_registration_action(event_id, user_id, "cancelled", outcome.cancelled.status);
        if let Some(promoted) = &outcome.promoted {
            log_registration_action(event_id, promoted.user_id, "promoted", promoted.status);
        }
        Ok(outcome)
    }

    /// Event creator override of a registration's status.
    ///
    /// Demoting a confirmed registration this way does not promote anyone
    /// from the waitlist.
    pub async fn override_status(
        &self,
        registration_id: Uuid,
        new_status: RegistrationStatus,
        caller_id: i64,
    ) -> Result<Registration> {
        debug!(registration_id = %registration_id, new_status = %new_status, caller_id = caller_id, "Overriding registration status");

        let event_id = self
            .store
            .find_registration(registration_id)
            .await?
            .map(|registration| registration.event_id)
            .ok_or(RollcallError::RegistrationNotFound { registration_id })
            .inspect_err(|err| log_rejection("override_status", err))?;

        let registration = self
            .store
            .transact(event_id, |ledger| ledger.override_status(registration_id, new_status, caller_id))
            .await
            .inspect_err(|err| log_rejection("override_status", err))?;

        log_registration_action(event_id, registration.user_id, "overridden", registration.status);
        Ok(registration)
    }

    /// Status of a user's registration, `None` when they never registered
    pub async fn get_registration_status(&self, event_id: Uuid, user_id: i64) -> Result<Option<RegistrationStatus>> {
        Ok(self
            .store
            .find_user_registration(event_id, user_id)
            .await?
            .map(|registration| registration.status))
    }

    /// Registrations currently holding a slot of the event
    pub async fn get_active_count(&self, event_id: Uuid) -> Result<i64> {
        self.store
            .count_active(event_id)
            .await?
            .ok_or(RollcallError::EventNotFound { event_id })
    }

    /// 1-based waitlist position, `None` when the user is not waitlisted
    pub async fn waitlist_position(&self, event_id: Uuid, user_id: i64) -> Result<Option<usize>> {
        let registrations = self.store.list_registrations(event_id).await?;

        Ok(registrations
            .iter()
            .filter(|r| r.status == RegistrationStatus::Waitlisted)
            .position(|r| r.user_id == user_id)
            .map(|idx| idx + 1))
    }

    /// Every registration of an event, oldest first
    pub async fn list_registrations(&self, event_id: Uuid) -> Result<Vec<Registration>> {
        self.store.list_registrations(event_id).await
    }

    /// Registrations awaiting a decision across the creator's events
    pub async fn pending_registrations(&self, creator_id: i64) -> Result<Vec<PendingRegistration>> {
        self.store.pending_registrations(creator_id).await
    }
}
