//! Registration repository implementation

use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::registration::{PendingRegistration, Registration};
use crate::utils::errors::{Result, RollcallError};

const REGISTRATION_COLUMNS: &str = "id, event_id, user_id, status, registered_at";

#[derive(Debug, Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_for_event<'e, E: PgExecutor<'e>>(executor: E, event_id: Uuid) -> Result<Vec<Registration>> {
        let registrations = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE event_id = $1 ORDER BY registered_at ASC, id ASC",
            REGISTRATION_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(executor)
        .await?;

        Ok(registrations)
    }

    /// Registrations of an event read inside a transaction
    pub async fn list_for_event_locked(&self, conn: &mut PgConnection, event_id: Uuid) -> Result<Vec<Registration>> {
        Self::fetch_for_event(conn, event_id).await
    }

    /// Registrations of an event in FIFO order
    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Registration>> {
        Self::fetch_for_event(&self.pool, event_id).await
    }

    /// Insert a registration; the (event_id, user_id) key rejects duplicates
    pub async fn insert(&self, conn: &mut PgConnection, registration: &Registration) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO registrations (id, event_id, user_id, status, registered_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(registration.id)
        .bind(registration.event_id)
        .bind(registration.user_id)
        .bind(registration.status)
        .bind(registration.registered_at)
        .execute(conn)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => RollcallError::AlreadyRegistered {
                event_id: registration.event_id,
                user_id: registration.user_id,
            },
            other => RollcallError::from(other),
        })?;

        Ok(())
    }

    /// Update registration status
    pub async fn update_status(&self, conn: &mut PgConnection, registration: &Registration) -> Result<()> {
        sqlx::query("UPDATE registrations SET status = $2 WHERE id = $1")
            .bind(registration.id)
            .bind(registration.status)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Remove every registration of an event
    pub async fn delete_for_event(&self, conn: &mut PgConnection, event_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM registrations WHERE event_id = $1")
            .bind(event_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Find registration by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE id = $1",
            REGISTRATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Find a user's registration for an event
    pub async fn find_for_user(&self, event_id: Uuid, user_id: i64) -> Result<Option<Registration>> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE event_id = $1 AND user_id = $2",
            REGISTRATION_COLUMNS
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Pending and waitlisted registrations on events owned by `creator_id`
    pub async fn get_pending_for_creator(&self, creator_id: i64) -> Result<Vec<PendingRegistration>> {
        let registrations = sqlx::query_as::<_, PendingRegistration>(
            r#"
            SELECT r.id, r.event_id, r.user_id, r.status, r.registered_at,
                   e.title AS event_title, e.event_date
            FROM registrations r
            JOIN events e ON r.event_id = e.id
            WHERE e.creator_id = $1
            AND r.status IN ('pending', 'waitlisted')
            ORDER BY e.event_date ASC, r.registered_at ASC
            "#,
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }
}
