//! Integration tests for single-flight refresh through the session context.
//!
//! Any number of concurrent callers must produce exactly one refresh call
//! and observe the same outcome.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use boxoffice_runtime::{SessionContext, SessionError, SessionEvent};
use boxoffice_testing::{MockSessionApi, fixtures, helpers};
use futures::future::join_all;
use std::time::Duration;

fn api() -> MockSessionApi {
    helpers::init_test_tracing();
    MockSessionApi::new().with_latency(Duration::from_millis(200))
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_refreshes_share_one_call() {
    let api = api();
    let context = SessionContext::default();
    context.establish(&fixtures::customer()).await;

    let outcomes = join_all((0..10).map(|_| context.refresh(&api))).await;

    assert_eq!(api.refresh_calls(), 1);
    for outcome in outcomes {
        assert_eq!(outcome, Ok(Some(fixtures::customer())));
    }
    assert!(!context.gate().is_refreshing());
    assert_eq!(context.gate().waiting(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_after_completion_starts_new_call() {
    let api = api();
    let context = SessionContext::default();

    join_all((0..3).map(|_| context.refresh(&api))).await;
    join_all((0..3).map(|_| context.refresh(&api))).await;

    assert_eq!(api.refresh_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refreshed_user_is_stored_once() {
    let api = api();
    api.push_refresh(Ok(Some(fixtures::other_customer())));
    let context = SessionContext::default();
    context.establish(&fixtures::customer()).await;
    let mut events = context.subscribe();

    join_all((0..5).map(|_| context.refresh(&api))).await;

    assert_eq!(context.store().user(), Some(fixtures::other_customer()));
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::Refreshed {
            user_id: Some("usr_customer_2".to_string())
        }
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_refresh_expires_once() {
    let api = api();
    api.push_refresh(Err(SessionError::Unauthorized));
    let context = SessionContext::default();
    context.establish(&fixtures::customer()).await;
    let mut events = context.subscribe();

    let outcomes = join_all((0..10).map(|_| context.refresh(&api))).await;

    assert_eq!(api.refresh_calls(), 1);
    assert!(outcomes.iter().all(|o| *o == Err(SessionError::Unauthorized)));
    assert!(context.is_expired());
    assert!(!context.store().is_authenticated());
    assert!(context.cache().is_empty().await);

    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::Expired {
            redirect: "/login?session_expired=true".to_string()
        }
    );
    assert!(events.try_recv().is_err());

    // A late 401 from another request changes nothing.
    assert!(!context.expire().await);
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_network_failure_keeps_session() {
    let api = api();
    api.push_refresh(Err(SessionError::Network("connection reset".to_string())));
    let context = SessionContext::default();
    context.establish(&fixtures::customer()).await;

    let outcomes = join_all((0..4).map(|_| context.refresh(&api))).await;

    assert_eq!(api.refresh_calls(), 1);
    for outcome in outcomes {
        assert!(matches!(outcome, Err(SessionError::Network(_))));
    }
    assert!(!context.is_expired());
    assert_eq!(context.store().user(), Some(fixtures::customer()));
}

#[tokio::test(start_paused = true)]
async fn test_waiters_spawned_on_other_tasks_share_outcome() {
    let api = api();
    let context = std::sync::Arc::new(SessionContext::default());

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let api = api.clone();
            let context = std::sync::Arc::clone(&context);
            tokio::spawn(async move { context.refresh(&api).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Ok(Some(fixtures::customer())));
    }
    assert_eq!(api.refresh_calls(), 1);
}
