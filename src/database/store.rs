//! Storage abstraction consumed by the registration engine
//!
//! A store owns the event and registration relations and provides the
//! transaction boundary: [`EventStore::transact`] runs a ledger transition
//! while no other mutation of the same event can interleave, and persists
//! the result only if the transition succeeded.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ledger::EventLedger;
use crate::models::{
    Event, EventStatus, EventSummary, PendingRegistration, RegisteredEvent, Registration,
};
use crate::utils::errors::Result;

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Lock `event_id`, load its ledger, apply `transition` and commit the
    /// changes it recorded. Errors from the transition or from storage leave
    /// the stored state untouched.
    async fn transact<T, F>(&self, event_id: Uuid, transition: F) -> Result<T>
    where
        F: FnOnce(&mut EventLedger) -> Result<T> + Send,
        T: Send;

    /// Persist a ledger built with [`EventLedger::create`]
    async fn insert_event(&self, ledger: EventLedger) -> Result<()>;

    async fn find_event(&self, event_id: Uuid) -> Result<Option<EventSummary>>;

    async fn find_registration(&self, registration_id: Uuid) -> Result<Option<Registration>>;

    async fn find_user_registration(&self, event_id: Uuid, user_id: i64) -> Result<Option<Registration>>;

    /// Registrations holding a slot, `None` when the event does not exist
    async fn count_active(&self, event_id: Uuid) -> Result<Option<i64>>;

    /// All registrations of an event in FIFO order
    async fn list_registrations(&self, event_id: Uuid) -> Result<Vec<Registration>>;

    /// Published events dated after now, soonest first
    async fn upcoming_events(&self, limit: i64) -> Result<Vec<EventSummary>>;

    async fn hosted_events(&self, creator_id: i64) -> Result<Vec<EventSummary>>;

    async fn registered_events(&self, user_id: i64) -> Result<Vec<RegisteredEvent>>;

    /// Pending and waitlisted registrations across every event `creator_id` owns
    async fn pending_registrations(&self, creator_id: i64) -> Result<Vec<PendingRegistration>>;

    async fn health_check(&self) -> Result<()>;
}

/// Ordering used for hosted-event listings: open upcoming events first, then
/// drafts, then everything else, latest date first within each group.
pub(crate) fn hosted_rank(event: &Event, now: DateTime<Utc>) -> u8 {
    match event.status {
        EventStatus::Published if event.event_date > now => 1,
        EventStatus::Draft => 2,
        _ => 3,
    }
}

/// Ordering used for a participant's registrations: upcoming events they still
/// hold a place or waitlist spot for, then upcoming ones they cancelled, then
/// past events, latest date first within each group.
pub(crate) fn registered_rank(entry: &RegisteredEvent, now: DateTime<Utc>) -> u8 {
    let upcoming = entry.summary.event.event_date > now;
    match (upcoming, entry.registration_status.is_cancelled()) {
        (true, false) => 1,
        (true, true) => 2,
        _ => 3,
    }
}
