//! Single-flight session refresh.
//!
//! Any number of tasks may discover at the same moment that the session needs
//! refreshing (a burst of 401 responses, the scheduled timer, the app coming
//! back into view). Only the first one, the *leader*, sends the refresh call.
//! Everyone else subscribes and receives a clone of the leader's outcome.
//!
//! ```text
//!  Idle ──run()──▶ Refreshing { waiters } ──leader finishes──▶ Idle
//!                       ▲        │                              │
//!                       └─run()──┘ (subscribe)                  └─▶ outcome fanned out
//! ```
//!
//! If the leader's future is dropped mid-flight the gate still returns to
//! `Idle`, and every waiter receives [`SessionError::Abandoned`].

use crate::error::SessionError;
use crate::metrics::RefreshMetrics;
use boxoffice_core::User;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// What a refresh produces: the refreshed user, if the server sent one.
pub type RefreshOutcome = Result<Option<User>, SessionError>;

#[derive(Debug, Default)]
enum GateState {
    #[default]
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

/// Coalesces concurrent refresh attempts into one call.
#[derive(Debug, Default)]
pub struct RefreshGate {
    state: Mutex<GateState>,
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

impl RefreshGate {
    /// Create an idle gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        // No code path panics while holding the lock; a poisoned state is
        // still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a refresh is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock(), GateState::Refreshing { .. })
    }

    /// Number of callers waiting on the in-flight refresh.
    #[must_use]
    pub fn waiting(&self) -> usize {
        match &*self.lock() {
            GateState::Idle => 0,
            GateState::Refreshing { waiters } => waiters.len(),
        }
    }

    /// Run `refresh` unless one is already in flight, in which case wait for
    /// that one instead.
    ///
    /// `refresh` is only invoked by the leader. Its outcome is returned to
    /// the leader and to every subscriber.
    pub async fn run<F, Fut>(&self, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome>,
    {
        let role = {
            let mut state = self.lock();
            match &mut *state {
                GateState::Idle => {
                    *state = GateState::Refreshing {
                        waiters: Vec::new(),
                    };
                    Role::Leader
                }
                GateState::Refreshing { waiters } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Role::Waiter(rx)
                }
            }
        };

        match role {
            Role::Waiter(rx) => {
                RefreshMetrics::record_waiter();
                tracing::debug!("Refresh in progress, waiting for its outcome");
                rx.await.unwrap_or(Err(SessionError::Abandoned))
            }
            Role::Leader => {
                RefreshMetrics::record_call();
                tracing::debug!("Starting session refresh");
                let mut leader = Leader {
                    gate: self,
                    done: false,
                };
                let outcome = refresh().await;
                if outcome.is_err() {
                    RefreshMetrics::record_failure();
                }
                leader.finish(&outcome);
                outcome
            }
        }
    }

    fn take_waiters(&self) -> Vec<oneshot::Sender<RefreshOutcome>> {
        match std::mem::take(&mut *self.lock()) {
            GateState::Idle => Vec::new(),
            GateState::Refreshing { waiters } => waiters,
        }
    }
}

/// Returns the gate to `Idle` however the leader exits.
struct Leader<'a> {
    gate: &'a RefreshGate,
    done: bool,
}

impl Leader<'_> {
    fn finish(&mut self, outcome: &RefreshOutcome) {
        self.done = true;
        let waiters = self.gate.take_waiters();
        tracing::debug!(
            waiters = waiters.len(),
            success = outcome.is_ok(),
            "Refresh finished"
        );
        for waiter in waiters {
            // A waiter that stopped listening is fine to skip.
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for Leader<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let waiters = self.gate.take_waiters();
        tracing::warn!(waiters = waiters.len(), "Refresh abandoned by its caller");
        RefreshMetrics::record_abandoned();
        for waiter in waiters {
            let _ = waiter.send(Err(SessionError::Abandoned));
        }
    }
}
