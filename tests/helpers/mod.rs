//! Test helpers module
//!
//! Engine construction and event fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::Once;

use chrono::{Duration, Utc};
use uuid::Uuid;

use rollcall::config::RegistrationConfig;
use rollcall::models::{CreateEventRequest, Event, EventStatus, Registration, RegistrationStatus};
use rollcall::{EventStore, MemoryStore, RegistrationEngine};

static INIT: Once = Once::new();

/// Creator of every fixture event
pub const OWNER: i64 = 1;

pub type MemoryEngine = RegistrationEngine<MemoryStore>;

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub fn memory_engine() -> MemoryEngine {
    init_tracing();
    RegistrationEngine::new(MemoryStore::new(), RegistrationConfig { upcoming_limit: 50 })
}

pub fn event_request(capacity: i32, status: EventStatus) -> CreateEventRequest {
    CreateEventRequest {
        title: "Friday swing social".to_string(),
        description: Some("Social dancing with a live band".to_string()),
        location: Some("Ballroom".to_string()),
        event_date: Utc::now() + Duration::days(14),
        capacity,
        status,
    }
}

/// Published event owned by [`OWNER`]. The owner holds one confirmed slot.
pub async fn published_event<S: EventStore>(engine: &RegistrationEngine<S>, capacity: i32) -> Event {
    engine
        .create_event(OWNER, event_request(capacity, EventStatus::Published))
        .await
        .expect("failed to create fixture event")
}

/// Register each user in turn, accepting the waitlist
pub async fn register_all<S: EventStore>(
    engine: &RegistrationEngine<S>,
    event_id: Uuid,
    users: &[i64],
) -> Vec<Registration> {
    let mut registrations = Vec::new();
    for user in users {
        registrations.push(
            engine
                .register(event_id, *user, true)
                .await
                .expect("fixture registration failed"),
        );
    }
    registrations
}

pub async fn status_of<S: EventStore>(
    engine: &RegistrationEngine<S>,
    event_id: Uuid,
    user_id: i64,
) -> Option<RegistrationStatus> {
    engine
        .get_registration_status(event_id, user_id)
        .await
        .expect("status lookup failed")
}

/// (user, status) pairs in FIFO order
pub async fn snapshot<S: EventStore>(
    engine: &RegistrationEngine<S>,
    event_id: Uuid,
) -> Vec<(i64, RegistrationStatus)> {
    engine
        .list_registrations(event_id)
        .await
        .expect("listing failed")
        .into_iter()
        .map(|r| (r.user_id, r.status))
        .collect()
}
