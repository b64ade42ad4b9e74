//! In-process event store
//!
//! Each event lives behind its own async mutex, so transitions on one event
//! are serialized while different events proceed in parallel. A transition
//! works on a copy of the record and the copy replaces the record only when
//! the transition succeeds.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

use super::store::{hosted_rank, registered_rank, EventStore};
use crate::ledger::EventLedger;
use crate::models::{
    Event, EventSummary, PendingRegistration, RegisteredEvent, Registration, RegistrationStatus,
};
use crate::utils::errors::{Result, RollcallError};

#[derive(Debug, Clone)]
struct EventRecord {
    event: Event,
    registrations: Vec<Registration>,
}

impl EventRecord {
    fn summary(&self) -> EventSummary {
        EventLedger::new(self.event.clone(), self.registrations.clone()).summary()
    }
}

/// `None` once the event has been deleted
type EventSlot = Arc<Mutex<Option<EventRecord>>>;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    events: Arc<RwLock<HashMap<Uuid, EventSlot>>>,
    /// Registration id to owning event id
    registrations: Arc<RwLock<HashMap<Uuid, Uuid>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, event_id: Uuid) -> Option<EventSlot> {
        self.events.read().await.get(&event_id).cloned()
    }

    async fn all_slots(&self) -> Vec<EventSlot> {
        self.events.read().await.values().cloned().collect()
    }

    /// Snapshot of every live event record
    async fn records(&self) -> Vec<EventRecord> {
        let mut records = Vec::new();
        for slot in self.all_slots().await {
            if let Some(record) = slot.lock().await.as_ref() {
                records.push(record.clone());
            }
        }
        records
    }

    async fn commit(
        &self,
        event_id: Uuid,
        guard: &mut MutexGuard<'_, Option<EventRecord>>,
        ledger: EventLedger,
    ) {
        let changes = ledger.changes().clone();

        if changes.event_deleted {
            if let Some(record) = guard.take() {
                let mut index = self.registrations.write().await;
                for registration in &record.registrations {
                    index.remove(&registration.id);
                }
            }
            self.events.write().await.remove(&event_id);
            debug!(event_id = %event_id, "Event removed from memory store");
            return;
        }

        if changes.is_empty() {
            return;
        }

        if !changes.inserted.is_empty() {
            let mut index = self.registrations.write().await;
            for id in &changes.inserted {
                index.insert(*id, event_id);
            }
        }

        **guard = Some(EventRecord {
            event: ledger.event().clone(),
            registrations: ledger.registrations().to_vec(),
        });
        debug!(
            event_id = %event_id,
            inserted = changes.inserted.len(),
            updated = changes.updated.len(),
            "Memory store transaction committed"
        );
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn transact<T, F>(&self, event_id: Uuid, transition: F) -> Result<T>
    where
        F: FnOnce(&mut EventLedger) -> Result<T> + Send,
        T: Send,
    {
        let slot = self
            .slot(event_id)
            .await
            .ok_or(RollcallError::EventNotFound { event_id })?;
        let mut guard = slot.lock().await;

        let mut ledger = match guard.as_ref() {
            Some(record) => EventLedger::new(record.event.clone(), record.registrations.clone()),
            None => return Err(RollcallError::EventNotFound { event_id }),
        };

        let value = transition(&mut ledger)?;
        self.commit(event_id, &mut guard, ledger).await;

        Ok(value)
    }

    async fn insert_event(&self, ledger: EventLedger) -> Result<()> {
        let event_id = ledger.event().id;
        let record = EventRecord {
            event: ledger.event().clone(),
            registrations: ledger.registrations().to_vec(),
        };

        {
            let mut events = self.events.write().await;
            if events.contains_key(&event_id) {
                return Err(RollcallError::InvalidInput(format!(
                    "event {} already exists",
                    event_id
                )));
            }
            events.insert(event_id, Arc::new(Mutex::new(Some(record))));
        }

        let mut index = self.registrations.write().await;
        for registration in ledger.registrations() {
            index.insert(registration.id, event_id);
        }

        Ok(())
    }

    async fn find_event(&self, event_id: Uuid) -> Result<Option<EventSummary>> {
        let Some(slot) = self.slot(event_id).await else {
            return Ok(None);
        };
        let guard = slot.lock().await;
        Ok(guard.as_ref().map(EventRecord::summary))
    }

    async fn find_registration(&self, registration_id: Uuid) -> Result<Option<Registration>> {
        let event_id = match self.registrations.read().await.get(&registration_id) {
            Some(event_id) => *event_id,
            None => return Ok(None),
        };
        let Some(slot) = self.slot(event_id).await else {
            return Ok(None);
        };
        let guard = slot.lock().await;
        Ok(guard.as_ref().and_then(|record| {
            record
                .registrations
                .iter()
                .find(|r| r.id == registration_id)
                .cloned()
        }))
    }

    async fn find_user_registration(&self, event_id: Uuid, user_id: i64) -> Result<Option<Registration>> {
        let Some(slot) = self.slot(event_id).await else {
            return Ok(None);
        };
        let guard = slot.lock().await;
        Ok(guard.as_ref().and_then(|record| {
            record
                .registrations
                .iter()
                .find(|r| r.user_id == user_id)
                .cloned()
        }))
    }

    async fn count_active(&self, event_id: Uuid) -> Result<Option<i64>> {
        Ok(self
            .find_event(event_id)
            .await?
            .map(|summary| summary.active_count))
    }

    async fn list_registrations(&self, event_id: Uuid) -> Result<Vec<Registration>> {
        let Some(slot) = self.slot(event_id).await else {
            return Ok(Vec::new());
        };
        let guard = slot.lock().await;
        Ok(guard
            .as_ref()
            .map(|record| {
                EventLedger::new(record.event.clone(), record.registrations.clone())
                    .registrations()
                    .to_vec()
            })
            .unwrap_or_default())
    }

    async fn upcoming_events(&self, limit: i64) -> Result<Vec<EventSummary>> {
        let now = Utc::now();
        let mut upcoming: Vec<EventSummary> = self
            .records()
            .await
            .iter()
            .filter(|record| record.event.status.accepts_registrations() && record.event.event_date > now)
            .map(EventRecord::summary)
            .collect();

        upcoming.sort_by_key(|summary| summary.event.event_date);
        upcoming.truncate(limit.max(0) as usize);
        Ok(upcoming)
    }

    async fn hosted_events(&self, creator_id: i64) -> Result<Vec<EventSummary>> {
        let now = Utc::now();
        let mut hosted: Vec<EventSummary> = self
            .records()
            .await
            .iter()
            .filter(|record| record.event.is_owned_by(creator_id))
            .map(EventRecord::summary)
            .collect();

        hosted.sort_by(|a, b| {
            hosted_rank(&a.event, now)
                .cmp(&hosted_rank(&b.event, now))
                .then_with(|| b.event.event_date.cmp(&a.event.event_date))
        });
        Ok(hosted)
    }

    async fn registered_events(&self, user_id: i64) -> Result<Vec<RegisteredEvent>> {
        let now = Utc::now();
        let mut registered: Vec<RegisteredEvent> = self
            .records()
            .await
            .iter()
            .filter_map(|record| {
                let registration = record.registrations.iter().find(|r| r.user_id == user_id)?;
                Some(RegisteredEvent {
                    summary: record.summary(),
                    registration_status: registration.status,
                })
            })
            .collect();

        registered.sort_by(|a, b| {
            registered_rank(a, now)
                .cmp(&registered_rank(b, now))
                .then_with(|| b.summary.event.event_date.cmp(&a.summary.event.event_date))
        });
        Ok(registered)
    }

    async fn pending_registrations(&self, creator_id: i64) -> Result<Vec<PendingRegistration>> {
        let mut pending: Vec<PendingRegistration> = self
            .records()
            .await
            .iter()
            .filter(|record| record.event.is_owned_by(creator_id))
            .flat_map(|record| {
                record
                    .registrations
                    .iter()
                    .filter(|r| {
                        matches!(r.status, RegistrationStatus::Pending | RegistrationStatus::Waitlisted)
                    })
                    .map(|r| PendingRegistration {
                        registration: r.clone(),
                        event_title: record.event.title.clone(),
                        event_date: record.event.event_date,
                    })
            })
            .collect();

        pending.sort_by(|a, b| {
            a.event_date
                .cmp(&b.event_date)
                .then_with(|| a.registration.registered_at.cmp(&b.registration.registered_at))
        });
        Ok(pending)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
