//! Capacity ledger
//!
//! An [`EventLedger`] is the working copy of one event row and its full
//! registration set, loaded by a store while it holds that event's lock.
//! Every registration rule (admission, cancellation, promotion, overrides and
//! reconciliation after event changes) is a synchronous transition on the
//! ledger. Transitions record what they touched in [`LedgerChanges`] so the
//! store can persist exactly those rows; a transition that returns an error
//! leaves a ledger the store must discard.

mod admission;
mod reconcile;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use uuid::Uuid;

use crate::models::{Event, EventSummary, Registration, RegistrationStatus};
use crate::utils::errors::{Result, RollcallError};

pub use reconcile::{validate_capacity, validate_event_date, validate_location, validate_title, MAX_TEXT_LEN};

/// Rows and flags a ledger transition changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerChanges {
    pub event_created: bool,
    pub event_updated: bool,
    pub event_deleted: bool,
    pub inserted: Vec<Uuid>,
    pub updated: Vec<Uuid>,
}

impl LedgerChanges {
    pub fn is_empty(&self) -> bool {
        !self.event_created
            && !self.event_updated
            && !self.event_deleted
            && self.inserted.is_empty()
            && self.updated.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct EventLedger {
    event: Event,
    /// Kept in FIFO order: `registered_at` ascending, id as the tie-break
    registrations: Vec<Registration>,
    changes: LedgerChanges,
}

impl EventLedger {
    /// Wrap an existing event and its registrations
    pub fn new(event: Event, mut registrations: Vec<Registration>) -> Self {
        registrations.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Self {
            event,
            registrations,
            changes: LedgerChanges::default(),
        }
    }

    /// Start a ledger for an event that does not exist in the store yet
    pub fn create(event: Event) -> Self {
        let mut ledger = Self::new(event, Vec::new());
        ledger.changes.event_created = true;
        ledger
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn changes(&self) -> &LedgerChanges {
        &self.changes
    }

    /// Registrations inserted by this ledger, in their final state
    pub fn inserted_rows(&self) -> impl Iterator<Item = &Registration> {
        self.registrations
            .iter()
            .filter(|r| self.changes.inserted.contains(&r.id))
    }

    /// Pre-existing registrations whose status changed
    pub fn updated_rows(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter().filter(|r| {
            self.changes.updated.contains(&r.id) && !self.changes.inserted.contains(&r.id)
        })
    }

    /// Number of registrations holding a slot
    pub fn active_count(&self) -> i64 {
        self.registrations
            .iter()
            .filter(|r| r.status.occupies_slot())
            .count() as i64
    }

    pub fn waitlisted_count(&self) -> i64 {
        self.waitlist().count() as i64
    }

    /// Slots still free under the current capacity
    pub fn free_slots(&self) -> i64 {
        (i64::from(self.event.capacity) - self.active_count()).max(0)
    }

    /// Waitlisted registrations, oldest first
    pub fn waitlist(&self) -> impl Iterator<Item = &Registration> {
        self.registrations
            .iter()
            .filter(|r| r.status == RegistrationStatus::Waitlisted)
    }

    /// 1-based position of `user_id` on the waitlist
    pub fn waitlist_position(&self, user_id: i64) -> Option<usize> {
        self.waitlist()
            .position(|r| r.user_id == user_id)
            .map(|idx| idx + 1)
    }

    pub fn find_for_user(&self, user_id: i64) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.user_id == user_id)
    }

    pub fn find(&self, registration_id: Uuid) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.id == registration_id)
    }

    pub fn summary(&self) -> EventSummary {
        EventSummary {
            event: self.event.clone(),
            active_count: self.active_count(),
            waitlisted_count: self.waitlisted_count(),
        }
    }

    fn ensure_owner(&self, caller_id: i64, action: &str) -> Result<()> {
        if self.event.is_owned_by(caller_id) {
            Ok(())
        } else {
            Err(RollcallError::PermissionDenied(format!(
                "user {} cannot {} event {}",
                caller_id, action, self.event.id
            )))
        }
    }

    /// Timestamp for a new registration, strictly after every existing one.
    /// Kept at microsecond precision, the resolution Postgres stores.
    fn next_registered_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let now = now.trunc_subsecs(6);
        match self.registrations.iter().map(|r| r.registered_at).max() {
            Some(last) if last >= now => last + Duration::microseconds(1),
            _ => now,
        }
    }

    fn insert(&mut self, registration: Registration) -> Registration {
        self.changes.inserted.push(registration.id);
        self.registrations.push(registration.clone());
        registration
    }

    fn set_status(&mut self, index: usize, status: RegistrationStatus) -> Registration {
        let registration = &mut self.registrations[index];
        registration.status = status;
        if !self.changes.updated.contains(&registration.id) {
            self.changes.updated.push(registration.id);
        }
        registration.clone()
    }

    fn touch_event(&mut self, now: DateTime<Utc>) {
        self.event.updated_at = now;
        self.changes.event_updated = true;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, Utc};
    use uuid::Uuid;

    use crate::models::{Event, EventStatus, Registration, RegistrationStatus};

    pub const OWNER: i64 = 1;

    pub fn published_event(capacity: i32) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            creator_id: OWNER,
            title: "Lindy Hop social".to_string(),
            description: None,
            location: Some("Main hall".to_string()),
            event_date: now + Duration::days(7),
            capacity,
            status: EventStatus::Published,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn registration(
        event: &Event,
        user_id: i64,
        status: RegistrationStatus,
        registered_at: DateTime<Utc>,
    ) -> Registration {
        Registration {
            id: Uuid::new_v4(),
            event_id: event.id,
            user_id,
            status,
            registered_at,
        }
    }
}
