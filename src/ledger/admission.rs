//! Admission, cancellation, promotion and creator overrides

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::EventLedger;
use crate::models::{Cancellation, EventStatus, Registration, RegistrationStatus};
use crate::utils::errors::{Result, RollcallError};

impl EventLedger {
    /// Register `user_id` as an ordinary participant.
    ///
    /// A user gets at most one registration per event, ever: any existing row,
    /// cancelled ones included, fails with `AlreadyRegistered`. Only published
    /// events accept registrations. Below capacity the new row is `pending`;
    /// at capacity it is `waitlisted` when the caller accepts a waitlist and
    /// rejected with `CapacityFull` otherwise.
    pub fn register(
        &mut self,
        user_id: i64,
        wants_waitlist: bool,
        now: DateTime<Utc>,
    ) -> Result<Registration> {
        self.ensure_not_registered(user_id)?;

        if !self.event.status.accepts_registrations() {
            return Err(RollcallError::EventNotOpen {
                event_id: self.event.id,
                status: self.event.status,
            });
        }

        self.admit(user_id, wants_waitlist, RegistrationStatus::Pending, now)
    }

    /// Admit `user_id` with `admitted` as the status used when a slot is
    /// free. Skips the publication check; event creation uses this to seat
    /// the creator on a draft event.
    pub fn admit(
        &mut self,
        user_id: i64,
        wants_waitlist: bool,
        admitted: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> Result<Registration> {
        if !admitted.occupies_slot() {
            return Err(RollcallError::InvalidInput(format!(
                "registrations cannot be admitted as {}",
                admitted
            )));
        }
        self.ensure_not_registered(user_id)?;

        let status = if self.free_slots() > 0 {
            admitted
        } else if wants_waitlist {
            RegistrationStatus::Waitlisted
        } else {
            return Err(RollcallError::CapacityFull {
                event_id: self.event.id,
                capacity: self.event.capacity,
            });
        };

        let registration = Registration {
            id: Uuid::new_v4(),
            event_id: self.event.id,
            user_id,
            status,
            registered_at: self.next_registered_at(now),
        };

        Ok(self.insert(registration))
    }

    /// Cancel the caller's own registration and hand a freed slot to the
    /// head of the waitlist.
    pub fn cancel(&mut self, user_id: i64) -> Result<Cancellation> {
        let index = self
            .registrations
            .iter()
            .position(|r| r.user_id == user_id && !r.status.is_cancelled())
            .ok_or(RollcallError::NoActiveRegistration {
                event_id: self.event.id,
                user_id,
            })?;

        let freed_slot = self.registrations[index].status.occupies_slot();
        let cancelled = self.set_status(index, RegistrationStatus::Cancelled);

        let promoted = if freed_slot {
            self.promote_waitlisted(1).into_iter().next()
        } else {
            None
        };

        Ok(Cancellation { cancelled, promoted })
    }

    /// Confirm up to `limit` waitlisted registrations, oldest first, never
    /// past the event's free slots.
    pub fn promote_waitlisted(&mut self, limit: i64) -> Vec<Registration> {
        let limit = limit.min(self.free_slots()).max(0) as usize;

        let candidates: Vec<usize> = self
            .registrations
            .iter()
            .enumerate()
            .filter(|(_, r)| r.status == RegistrationStatus::Waitlisted)
            .map(|(idx, _)| idx)
            .take(limit)
            .collect();

        candidates
            .into_iter()
            .map(|idx| self.set_status(idx, RegistrationStatus::Confirmed))
            .collect()
    }

    /// Creator override of one registration's status.
    ///
    /// Targets are limited to confirmed, waitlisted and cancelled. Moving a
    /// registration into a slot fails with `CapacityFull` when the other
    /// slot holders already fill the event. Demotions free a slot without
    /// promoting anyone from the waitlist; only participant cancellations and
    /// capacity increases promote.
    pub fn override_status(
        &mut self,
        registration_id: Uuid,
        new_status: RegistrationStatus,
        caller_id: i64,
    ) -> Result<Registration> {
        self.ensure_owner(caller_id, "manage registrations for")?;

        let index = self
            .registrations
            .iter()
            .position(|r| r.id == registration_id)
            .ok_or(RollcallError::RegistrationNotFound { registration_id })?;
        let current = self.registrations[index].status;

        if new_status == RegistrationStatus::Pending {
            return Err(RollcallError::InvalidStatusTransition {
                from: current,
                to: new_status,
            });
        }
        if current == new_status {
            return Ok(self.registrations[index].clone());
        }
        if self.event.status == EventStatus::Cancelled && !new_status.is_cancelled() {
            return Err(RollcallError::EventNotOpen {
                event_id: self.event.id,
                status: self.event.status,
            });
        }

        if new_status.occupies_slot() && !current.occupies_slot() && self.free_slots() == 0 {
            return Err(RollcallError::CapacityFull {
                event_id: self.event.id,
                capacity: self.event.capacity,
            });
        }

        Ok(self.set_status(index, new_status))
    }

    fn ensure_not_registered(&self, user_id: i64) -> Result<()> {
        if self.find_for_user(user_id).is_some() {
            return Err(RollcallError::AlreadyRegistered {
                event_id: self.event.id,
                user_id,
            });
        }
        Ok(())
    }
}
