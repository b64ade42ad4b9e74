//! Event repository implementation

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::event::{Event, EventSummary, RegisteredEvent};
use crate::utils::errors::Result;

const EVENT_COLUMNS: &str =
    "id, creator_id, title, description, location, event_date, capacity, status, created_at, updated_at";

/// Event columns plus the capacity ledger counts; callers append WHERE and
/// must group by `e.id`
const SUMMARY_SELECT: &str = r#"
    SELECT e.id, e.creator_id, e.title, e.description, e.location, e.event_date,
           e.capacity, e.status, e.created_at, e.updated_at,
           COUNT(r.id) FILTER (WHERE r.status IN ('pending', 'confirmed')) AS active_count,
           COUNT(r.id) FILTER (WHERE r.status = 'waitlisted') AS waitlisted_count
    FROM events e
    LEFT JOIN registrations r ON r.event_id = e.id
"#;

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load an event and hold its row lock until the transaction ends
    pub async fn lock(&self, conn: &mut PgConnection, id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1 FOR UPDATE",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(event)
    }

    /// Insert a new event
    pub async fn insert(&self, conn: &mut PgConnection, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, creator_id, title, description, location, event_date, capacity, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(event.id)
        .bind(event.creator_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.event_date)
        .bind(event.capacity)
        .bind(event.status)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Write back every mutable column of an event
    pub async fn update(&self, conn: &mut PgConnection, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE events
            SET title = $2,
                description = $3,
                location = $4,
                event_date = $5,
                capacity = $6,
                status = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.event_date)
        .bind(event.capacity)
        .bind(event.status)
        .bind(event.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Delete event
    pub async fn delete(&self, conn: &mut PgConnection, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Find event by ID with its counts
    pub async fn find_summary(&self, id: Uuid) -> Result<Option<EventSummary>> {
        let summary = sqlx::query_as::<_, EventSummary>(&format!(
            "{} WHERE e.id = $1 GROUP BY e.id",
            SUMMARY_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Get upcoming published events
    pub async fn get_upcoming_events(&self, limit: i64) -> Result<Vec<EventSummary>> {
        let events = sqlx::query_as::<_, EventSummary>(&format!(
            "{} WHERE e.event_date > NOW() AND e.status = 'published' \
             GROUP BY e.id ORDER BY e.event_date ASC LIMIT $1",
            SUMMARY_SELECT
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Get events created by user
    pub async fn get_hosted_events(&self, creator_id: i64) -> Result<Vec<EventSummary>> {
        let events = sqlx::query_as::<_, EventSummary>(&format!(
            r#"{} WHERE e.creator_id = $1
            GROUP BY e.id
            ORDER BY
                CASE
                    WHEN e.status = 'published' AND e.event_date > NOW() THEN 1
                    WHEN e.status = 'draft' THEN 2
                    ELSE 3
                END,
                e.event_date DESC"#,
            SUMMARY_SELECT
        ))
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Get events user is registered for, with their own registration status
    pub async fn get_registered_events(&self, user_id: i64) -> Result<Vec<RegisteredEvent>> {
        let events = sqlx::query_as::<_, RegisteredEvent>(
            r#"
            SELECT e.id, e.creator_id, e.title, e.description, e.location, e.event_date,
                   e.capacity, e.status, e.created_at, e.updated_at,
                   COUNT(r.id) FILTER (WHERE r.status IN ('pending', 'confirmed')) AS active_count,
                   COUNT(r.id) FILTER (WHERE r.status = 'waitlisted') AS waitlisted_count,
                   mine.status AS registration_status
            FROM events e
            JOIN registrations mine ON mine.event_id = e.id AND mine.user_id = $1
            LEFT JOIN registrations r ON r.event_id = e.id
            GROUP BY e.id, mine.status
            ORDER BY
                CASE
                    WHEN e.event_date > NOW() AND mine.status <> 'cancelled' THEN 1
                    WHEN e.event_date > NOW() THEN 2
                    ELSE 3
                END,
                e.event_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}
