//! Database service layer
//!
//! `DatabaseService` is the Postgres [`EventStore`]. Each transition runs in
//! its own transaction that starts by locking the event row, so concurrent
//! mutations of one event queue behind each other while other events are
//! unaffected.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::{PgConnection, Postgres, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::store::EventStore;
use crate::database::{DatabasePool, EventRepository, RegistrationRepository};
use crate::ledger::EventLedger;
use crate::models::{EventSummary, PendingRegistration, RegisteredEvent, Registration};
use crate::utils::errors::{Result, RollcallError};
use crate::utils::logging::log_store_operation;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub events: EventRepository,
    pub registrations: RegistrationRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Write the rows a ledger transition changed
    async fn persist(&self, conn: &mut PgConnection, ledger: &EventLedger) -> Result<()> {
        let changes = ledger.changes();
        let event = ledger.event();

        if changes.event_deleted {
            let removed = self.registrations.delete_for_event(&mut *conn, event.id).await?;
            self.events.delete(&mut *conn, event.id).await?;
            debug!(event_id = %event.id, registrations = removed, "Event deleted with its registrations");
            return Ok(());
        }

        if changes.event_created {
            self.events.insert(&mut *conn, event).await?;
        } else if changes.event_updated {
            self.events.update(&mut *conn, event).await?;
        }

        for registration in ledger.inserted_rows() {
            self.registrations.insert(&mut *conn, registration).await?;
        }
        for registration in ledger.updated_rows() {
            self.registrations.update_status(&mut *conn, registration).await?;
        }

        Ok(())
    }

    async fn rollback(tx: Transaction<'_, Postgres>, event_id: Uuid) {
        if let Err(err) = tx.rollback().await {
            warn!(event_id = %event_id, error = %err, "Failed to roll back transaction");
        }
    }
}

#[async_trait]
impl EventStore for DatabaseService {
    async fn transact<T, F>(&self, event_id: Uuid, transition: F) -> Result<T>
    where
        F: FnOnce(&mut EventLedger) -> Result<T> + Send,
        T: Send,
    {
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;

        let event = match self.events.lock(&mut *tx, event_id).await? {
            Some(event) => event,
            None => {
                Self::rollback(tx, event_id).await;
                return Err(RollcallError::EventNotFound { event_id });
            }
        };
        let registrations = self
            .registrations
            .list_for_event_locked(&mut *tx, event_id)
            .await?;

        let mut ledger = EventLedger::new(event, registrations);
        let value = match transition(&mut ledger) {
            Ok(value) => value,
            Err(err) => {
                Self::rollback(tx, event_id).await;
                return Err(err);
            }
        };

        if let Err(err) = self.persist(&mut *tx, &ledger).await {
            Self::rollback(tx, event_id).await;
            log_store_operation("transact", started.elapsed().as_millis() as u64, false);
            return Err(err);
        }
        tx.commit().await?;

        log_store_operation("transact", started.elapsed().as_millis() as u64, true);
        Ok(value)
    }

    async fn insert_event(&self, ledger: EventLedger) -> Result<()> {
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;

        if let Err(err) = self.persist(&mut *tx, &ledger).await {
            Self::rollback(tx, ledger.event().id).await;
            log_store_operation("insert_event", started.elapsed().as_millis() as u64, false);
            return Err(err);
        }
        tx.commit().await?;

        log_store_operation("insert_event", started.elapsed().as_millis() as u64, true);
        Ok(())
    }

    async fn find_event(&self, event_id: Uuid) -> Result<Option<EventSummary>> {
        self.events.find_summary(event_id).await
    }

    async fn find_registration(&self, registration_id: Uuid) -> Result<Option<Registration>> {
        self.registrations.find_by_id(registration_id).await
    }

    async fn find_user_registration(&self, event_id: Uuid, user_id: i64) -> Result<Option<Registration>> {
        self.registrations.find_for_user(event_id, user_id).await
    }

    async fn count_active(&self, event_id: Uuid) -> Result<Option<i64>> {
        Ok(self
            .events
            .find_summary(event_id)
            .await?
            .map(|summary| summary.active_count))
    }

    async fn list_registrations(&self, event_id: Uuid) -> Result<Vec<Registration>> {
        self.registrations.list_for_event(event_id).await
    }

    async fn upcoming_events(&self, limit: i64) -> Result<Vec<EventSummary>> {
        self.events.get_upcoming_events(limit).await
    }

    async fn hosted_events(&self, creator_id: i64) -> Result<Vec<EventSummary>> {
        self.events.get_hosted_events(creator_id).await
    }

    async fn registered_events(&self, user_id: i64) -> Result<Vec<RegisteredEvent>> {
        self.events.get_registered_events(user_id).await
    }

    async fn pending_registrations(&self, creator_id: i64) -> Result<Vec<PendingRegistration>> {
        self.registrations.get_pending_for_creator(creator_id).await
    }

    async fn health_check(&self) -> Result<()> {
        crate::database::connection::health_check(&self.pool).await
    }
}
