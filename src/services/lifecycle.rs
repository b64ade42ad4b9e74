//! Event lifecycle operations
//!
//! Creation, owner edits, capacity changes, cancellation and deletion, each
//! reconciling the event's registrations inside the same transaction as the
//! event change itself.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::RegistrationEngine;
use crate::database::EventStore;
use crate::ledger::{
    validate_capacity, validate_event_date, validate_location, validate_title, EventLedger,
};
use crate::models::{
    CreateEventRequest, Event, EventSummary, Reconciliation, RegisteredEvent, RegistrationStatus,
    UpdateEventRequest,
};
use crate::utils::errors::{Result, RollcallError};
use crate::utils::logging::{log_event_action, log_reconciliation, log_rejection};

impl<S: EventStore> RegistrationEngine<S> {
    /// Create an event owned by `creator_id` and seat the creator as a
    /// confirmed participant in the same unit of work
    pub async fn create_event(&self, creator_id: i64, request: CreateEventRequest) -> Result<Event> {
        let now = Utc::now();
        validate_title(&request.title)
            .and_then(|_| validate_location(request.location.as_deref()))
            .and_then(|_| validate_capacity(request.capacity))
            .and_then(|_| validate_event_date(request.event_date, now))
            .inspect_err(|err| log_rejection("create_event", err))?;

        let event = Event {
            id: Uuid::new_v4(),
            creator_id,
            title: request.title,
            description: request.description,
            location: request.location,
            event_date: request.event_date,
            capacity: request.capacity,
            status: request.status,
            created_at: now,
            updated_at: now,
        };

        let mut ledger = EventLedger::create(event.clone());
        ledger.admit(creator_id, false, RegistrationStatus::Confirmed, now)?;
        self.store.insert_event(ledger).await?;

        log_event_action(event.id, "created", creator_id, Some(event.status.as_str()));
        Ok(event)
    }

    /// Owner edit of an event; see [`EventLedger::update_details`]
    pub async fn update_event(
        &self,
        event_id: Uuid,
        caller_id: i64,
        request: UpdateEventRequest,
    ) -> Result<Reconciliation> {
        debug!(event_id = %event_id, caller_id = caller_id, "Updating event");

        let outcome = self
            .store
            .transact(event_id, |ledger| ledger.update_details(caller_id, request, Utc::now()))
            .await
            .inspect_err(|err| log_rejection("update_event", err))?;

        log_event_action(event_id, "updated", caller_id, None);
        log_reconciliation(event_id, "update", outcome.promoted.len(), outcome.cancelled.len());
        Ok(outcome)
    }

    /// Change an event's capacity.
    ///
    /// Fails with `CapacityBelowDemand` when fewer slots than active
    /// registrations are requested. An increase promotes waitlisted
    /// registrations, oldest first, into the new slots.
    pub async fn update_capacity(&self, event_id: Uuid, new_capacity: i32, caller_id: i64) -> Result<Reconciliation> {
        debug!(event_id = %event_id, new_capacity = new_capacity, caller_id = caller_id, "Updating event capacity");

        let outcome = self
            .store
            .transact(event_id, |ledger| ledger.update_capacity(caller_id, new_capacity, Utc::now()))
            .await
            .inspect_err(|err| log_rejection("update_capacity", err))?;

        log_event_action(event_id, "capacity_changed", caller_id, None);
        log_reconciliation(event_id, "capacity", outcome.promoted.len(), 0);
        Ok(outcome)
    }

    /// Cancel an event and every registration on it
    pub async fn cancel_event(&self, event_id: Uuid, caller_id: i64) -> Result<Reconciliation> {
        let outcome = self
            .store
            .transact(event_id, |ledger| ledger.cancel_event(caller_id, Utc::now()))
            .await
            .inspect_err(|err| log_rejection("cancel_event", err))?;

        log_event_action(event_id, "cancelled", caller_id, None);
        log_reconciliation(event_id, "cancellation", 0, outcome.cancelled.len());
        Ok(outcome)
    }

    /// Open a draft event for registration
    pub async fn publish_event(&self, event_id: Uuid, caller_id: i64) -> Result<Event> {
        let event = self
            .store
            .transact(event_id, |ledger| {
                ledger.publish(caller_id, Utc::now())?;
                Ok(ledger.event().clone())
            })
            .await
            .inspect_err(|err| log_rejection("publish_event", err))?;

        log_event_action(event_id, "published", caller_id, None);
        Ok(event)
    }

    /// Delete an event and all of its registrations
    pub async fn delete_event(&self, event_id: Uuid, caller_id: i64) -> Result<()> {
        let removed = self
            .store
            .transact(event_id, |ledger| {
                ledger.delete(caller_id)?;
                Ok(ledger.registrations().len())
            })
            .await
            .inspect_err(|err| log_rejection("delete_event", err))?;

        info!(event_id = %event_id, caller_id = caller_id, registrations = removed, "Event deleted");
        Ok(())
    }

    /// Event with its active and waitlist counts
    pub async fn get_event(&self, event_id: Uuid) -> Result<EventSummary> {
        self.store
            .find_event(event_id)
            .await?
            .ok_or(RollcallError::EventNotFound { event_id })
    }

    /// Published future events, soonest first. Falls back to the configured
    /// page size when `limit` is `None`.
    pub async fn upcoming_events(&self, limit: Option<i64>) -> Result<Vec<EventSummary>> {
        let limit = limit.unwrap_or(self.settings.upcoming_limit);
        if limit < 1 {
            let err = RollcallError::InvalidInput(format!("listing limit must be positive, got {}", limit));
            log_rejection("upcoming_events", &err);
            return Err(err);
        }
        self.store.upcoming_events(limit).await
    }

    pub async fn hosted_events(&self, creator_id: i64) -> Result<Vec<EventSummary>> {
        self.store.hosted_events(creator_id).await
    }

    pub async fn registered_events(&self, user_id: i64) -> Result<Vec<RegisteredEvent>> {
        self.store.registered_events(user_id).await
    }
}
