//! Randomized operation sequences against a single event ledger

use std::collections::HashSet;

use chrono::{Duration, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use rollcall::ledger::EventLedger;
use rollcall::models::{Event, EventStatus, RegistrationStatus, UpdateEventRequest};

const OWNER: i64 = 1;

#[derive(Debug, Clone)]
enum Op {
    Register { user: i64, wants_waitlist: bool },
    Cancel { user: i64 },
    Override { pick: usize, status: RegistrationStatus },
    Capacity(i32),
    CancelEvent,
    Republish,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let status = prop_oneof![
        Just(RegistrationStatus::Pending),
        Just(RegistrationStatus::Confirmed),
        Just(RegistrationStatus::Waitlisted),
        Just(RegistrationStatus::Cancelled),
    ];

    prop_oneof![
        6 => (2i64..20, any::<bool>())
            .prop_map(|(user, wants_waitlist)| Op::Register { user, wants_waitlist }),
        3 => (1i64..20).prop_map(|user| Op::Cancel { user }),
        2 => (0usize..32, status).prop_map(|(pick, status)| Op::Override { pick, status }),
        2 => (0i32..12).prop_map(Op::Capacity),
        1 => Just(Op::CancelEvent),
        1 => Just(Op::Republish),
    ]
}

fn fresh_ledger(capacity: i32) -> EventLedger {
    let now = Utc::now();
    EventLedger::new(
        Event {
            id: Uuid::new_v4(),
            creator_id: OWNER,
            title: "Shag workshop".to_string(),
            description: None,
            location: None,
            event_date: now + Duration::days(30),
            capacity,
            status: EventStatus::Published,
            created_at: now,
            updated_at: now,
        },
        Vec::new(),
    )
}

fn apply(ledger: &mut EventLedger, op: &Op) -> rollcall::Result<()> {
    let now = Utc::now();
    match op {
        Op::Register { user, wants_waitlist } => ledger.register(*user, *wants_waitlist, now).map(|_| ()),
        Op::Cancel { user } => ledger.cancel(*user).map(|_| ()),
        Op::Override { pick, status } => {
            let Some(target) = ledger.registrations().get(*pick).map(|r| r.id) else {
                return Ok(());
            };
            ledger.override_status(target, *status, OWNER).map(|_| ())
        }
        Op::Capacity(capacity) => ledger.update_capacity(OWNER, *capacity, now).map(|_| ()),
        Op::CancelEvent => ledger.cancel_event(OWNER, now).map(|_| ()),
        Op::Republish => ledger.publish(OWNER, now),
    }
}

proptest! {
    #[test]
    fn capacity_and_ordering_hold_for_any_sequence(
        capacity in 1i32..6,
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut ledger = fresh_ledger(capacity);

        for op in &ops {
            // a rejected transition leaves a ledger the caller throws away
            let mut attempt = ledger.clone();
            if apply(&mut attempt, op).is_err() {
                continue;
            }
            ledger = EventLedger::new(attempt.event().clone(), attempt.registrations().to_vec());

            prop_assert!(ledger.active_count() <= i64::from(ledger.event().capacity));

            let users: HashSet<i64> = ledger.registrations().iter().map(|r| r.user_id).collect();
            prop_assert_eq!(users.len(), ledger.registrations().len());

            prop_assert!(ledger
                .registrations()
                .windows(2)
                .all(|pair| pair[0].registered_at < pair[1].registered_at));

            if ledger.event().status == EventStatus::Cancelled && matches!(op, Op::CancelEvent) {
                prop_assert_eq!(ledger.active_count(), 0);
                prop_assert_eq!(ledger.waitlisted_count(), 0);
            }
        }
    }

    #[test]
    fn capacity_increase_fills_from_waitlist(
        capacity in 1i32..5,
        extra in 1i32..6,
        waiting in 0i64..8,
    ) {
        let mut ledger = fresh_ledger(capacity);
        let now = Utc::now();
        for user in 0..(i64::from(capacity) + waiting) {
            ledger.register(100 + user, true, now).unwrap();
        }
        let waitlisted_before = ledger.waitlisted_count();

        let outcome = ledger.update_capacity(OWNER, capacity + extra, now).unwrap();

        let expected = waitlisted_before.min(i64::from(extra));
        prop_assert_eq!(outcome.promoted.len() as i64, expected);
        prop_assert!(outcome.promoted.iter().all(|r| r.status == RegistrationStatus::Confirmed));
        prop_assert_eq!(ledger.waitlisted_count(), waitlisted_before - expected);

        // promotions follow registration order
        let promoted_users: Vec<i64> = outcome.promoted.iter().map(|r| r.user_id).collect();
        let first_waiting: Vec<i64> = (0..expected).map(|i| 100 + i64::from(capacity) + i).collect();
        prop_assert_eq!(promoted_users, first_waiting);
    }

    #[test]
    fn capacity_decrease_below_demand_is_rejected(
        capacity in 2i32..8,
    ) {
        let mut ledger = fresh_ledger(capacity);
        let now = Utc::now();
        for user in 0..i64::from(capacity) {
            ledger.register(200 + user, false, now).unwrap();
        }

        let result = ledger.update_capacity(OWNER, capacity - 1, now);

        prop_assert!(result.is_err());
        prop_assert_eq!(ledger.event().capacity, capacity);
        prop_assert_eq!(ledger.active_count(), i64::from(capacity));
    }

    #[test]
    fn update_request_with_cancellation_never_promotes(
        capacity in 1i32..4,
        waiting in 1i64..5,
    ) {
        let mut ledger = fresh_ledger(capacity);
        let now = Utc::now();
        for user in 0..(i64::from(capacity) + waiting) {
            ledger.register(300 + user, true, now).unwrap();
        }

        let request = UpdateEventRequest {
            capacity: Some(capacity + 10),
            status: Some(EventStatus::Cancelled),
            ..Default::default()
        };
        let outcome = ledger.update_details(OWNER, request, now).unwrap();

        prop_assert!(outcome.promoted.is_empty());
        prop_assert_eq!(ledger.active_count(), 0);
    }
}
