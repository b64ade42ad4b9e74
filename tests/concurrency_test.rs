//! Concurrent registrations and cancellations racing on the same event

mod helpers;

use futures::future::join_all;

use helpers::*;
use rollcall::models::RegistrationStatus;
use rollcall::RollcallError;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_for_last_slot() {
    let engine = memory_engine();
    let event = published_event(&engine, 2).await;

    let attempts = (100..116).map(|user| {
        let engine = engine.clone();
        let event_id = event.id;
        tokio::spawn(async move { engine.register(event_id, user, false).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("registration task panicked"))
        .collect();

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(RollcallError::CapacityFull { .. })))
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(rejected, results.len() - 1);
    assert_eq!(engine.get_active_count(event.id).await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_fill_then_waitlist() {
    let engine = memory_engine();
    let event = published_event(&engine, 5).await;

    let attempts = (200..230).map(|user| {
        let engine = engine.clone();
        let event_id = event.id;
        tokio::spawn(async move { engine.register(event_id, user, true).await })
    });
    for joined in join_all(attempts).await {
        joined.expect("registration task panicked").expect("waitlisting never fails");
    }

    let registrations = engine.list_registrations(event.id).await.unwrap();
    let active = registrations.iter().filter(|r| r.status.occupies_slot()).count();
    let waitlisted = registrations
        .iter()
        .filter(|r| r.status == RegistrationStatus::Waitlisted)
        .count();
    assert_eq!(active, 5);
    assert_eq!(waitlisted, 26);
    assert!(registrations
        .windows(2)
        .all(|pair| pair[0].registered_at < pair[1].registered_at));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicate_registration_race() {
    let engine = memory_engine();
    let event = published_event(&engine, 10).await;

    let attempts = (0..8).map(|_| {
        let engine = engine.clone();
        let event_id = event.id;
        tokio::spawn(async move { engine.register(event_id, 300, true).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("registration task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, RollcallError::AlreadyRegistered { user_id: 300, .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancellations_racing_registrations_keep_capacity() {
    let engine = memory_engine();
    let event = published_event(&engine, 4).await;
    register_all(&engine, event.id, &[10, 11, 12, 13, 14, 15]).await;

    let cancels = [10, 11, 12].into_iter().map(|user| {
        let engine = engine.clone();
        let event_id = event.id;
        tokio::spawn(async move { engine.cancel(event_id, user).await.map(|_| ()) })
    });
    let registers = (20..26).map(|user| {
        let engine = engine.clone();
        let event_id = event.id;
        tokio::spawn(async move { engine.register(event_id, user, true).await.map(|_| ()) })
    });
    let capacity_bump = {
        let engine = engine.clone();
        let event_id = event.id;
        tokio::spawn(async move { engine.update_capacity(event_id, 6, OWNER).await.map(|_| ()) })
    };

    let mut tasks: Vec<_> = cancels.chain(registers).collect();
    tasks.push(capacity_bump);
    for joined in join_all(tasks).await {
        joined.expect("task panicked").expect("operation failed");
    }

    let summary = engine.get_event(event.id).await.unwrap();
    assert_eq!(summary.event.capacity, 6);
    assert_eq!(summary.active_count, 6);
    // 1 owner + 6 + 6 registrations, 3 of them cancelled
    assert_eq!(summary.waitlisted_count, 13 - 3 - 6);
}
