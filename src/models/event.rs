//! Event model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::registration::RegistrationStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub creator_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: DateTime<Utc>,
    pub capacity: i32,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether `user_id` owns this event
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.creator_id == user_id
    }
}

/// Publication state of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Cancelled => "cancelled",
        }
    }

    /// Only published events accept new registrations
    pub fn accepts_registrations(&self) -> bool {
        matches!(self, EventStatus::Published)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: DateTime<Utc>,
    pub capacity: i32,
    pub status: EventStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
    pub status: Option<EventStatus>,
}

/// An event together with its capacity ledger counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EventSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    /// Registrations currently holding a slot (pending or confirmed)
    pub active_count: i64,
    pub waitlisted_count: i64,
}

impl EventSummary {
    pub fn remaining_slots(&self) -> i64 {
        (i64::from(self.event.capacity) - self.active_count).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.remaining_slots() == 0
    }
}

/// An event seen from one registrant's side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RegisteredEvent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub summary: EventSummary,
    pub registration_status: RegistrationStatus,
}
