//! Scripted [`SessionApi`] for session runtime tests.
//!
//! Outcomes are queued per call kind and consumed in order. When a queue is
//! empty the mock answers with success for [`fixtures::customer`].

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity

use crate::fixtures;
use boxoffice_core::User;
use boxoffice_runtime::{RefreshOutcome, SessionApi, SessionError};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct Script {
    refresh: VecDeque<RefreshOutcome>,
    profile: VecDeque<Result<User, SessionError>>,
}

/// Scripted session API.
///
/// # Example
///
/// ```
/// use boxoffice_runtime::{SessionApi, SessionError};
/// use boxoffice_testing::MockSessionApi;
///
/// # tokio_test::block_on(async {
/// let api = MockSessionApi::new();
/// api.push_refresh(Err(SessionError::Unauthorized));
///
/// assert_eq!(api.refresh_token().await, Err(SessionError::Unauthorized));
/// assert!(api.refresh_token().await.is_ok());
/// assert_eq!(api.refresh_calls(), 2);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockSessionApi {
    script: Arc<Mutex<Script>>,
    refresh_calls: Arc<AtomicUsize>,
    profile_calls: Arc<AtomicUsize>,
    latency: Duration,
}

impl MockSessionApi {
    /// Mock that answers immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer by `latency` (uses `tokio::time`, so paused
    /// clocks apply).
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue the outcome of a future refresh call.
    pub fn push_refresh(&self, outcome: RefreshOutcome) {
        self.script.lock().unwrap().refresh.push_back(outcome);
    }

    /// Queue the outcome of a future profile call.
    pub fn push_profile(&self, outcome: Result<User, SessionError>) {
        self.script.lock().unwrap().profile.push_back(outcome);
    }

    /// Refresh calls received so far.
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Profile calls received so far.
    #[must_use]
    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    async fn answer<T>(latency: Duration, outcome: T) -> T {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        outcome
    }
}

impl SessionApi for MockSessionApi {
    fn refresh_token(&self) -> impl Future<Output = RefreshOutcome> + Send {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .lock()
            .unwrap()
            .refresh
            .pop_front()
            .unwrap_or_else(|| Ok(Some(fixtures::customer())));
        Self::answer(self.latency, outcome)
    }

    fn profile(&self) -> impl Future<Output = Result<User, SessionError>> + Send {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .lock()
            .unwrap()
            .profile
            .pop_front()
            .unwrap_or_else(|| Ok(fixtures::customer()));
        Self::answer(self.latency, outcome)
    }
}
