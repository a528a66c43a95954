//! State shared by the HTTP client and the session manager.
//!
//! Both sides refresh through the same [`RefreshGate`] and end a session
//! through the same [`SessionContext::expire`], so a burst of 401s and a
//! scheduled refresh never produce two refresh calls or two expiries.

use crate::cache::{QueryCache, keys};
use crate::error::SessionError;
use crate::metrics::SessionMetrics;
use crate::refresh::{RefreshGate, RefreshOutcome};
use crate::session::SessionApi;
use crate::store::AuthStore;
use boxoffice_core::User;
use boxoffice_core::routes::SESSION_EXPIRED_REDIRECT;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 32;

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user signed in or a session was resumed.
    Established {
        /// Signed-in user id.
        user_id: String,
    },
    /// A refresh succeeded.
    Refreshed {
        /// Refreshed user id, when the server returned the user.
        user_id: Option<String>,
    },
    /// The server ended the session. Navigate to `redirect`.
    Expired {
        /// Login route to show.
        redirect: String,
    },
    /// The user signed out.
    SignedOut,
}

/// Result of re-verifying a session against the profile endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// The server confirmed the session.
    Valid(User),
    /// The check failed for a reason other than 401; the session is kept.
    AssumedValid(SessionError),
    /// The server rejected the session; it has been expired.
    Expired,
}

impl Verification {
    /// Whether the session survived the check.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !matches!(self, Self::Expired)
    }
}

/// Auth store, refresh gate, query cache and event channel.
#[derive(Debug)]
pub struct SessionContext {
    store: AuthStore,
    gate: RefreshGate,
    cache: QueryCache,
    events: broadcast::Sender<SessionEvent>,
    expired: AtomicBool,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(AuthStore::in_memory(), QueryCache::default())
    }
}

impl SessionContext {
    /// Context over the given store and cache.
    #[must_use]
    pub fn new(store: AuthStore, cache: QueryCache) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            gate: RefreshGate::new(),
            cache,
            events,
            expired: AtomicBool::new(false),
        }
    }

    /// Auth state.
    #[must_use]
    pub const fn store(&self) -> &AuthStore {
        &self.store
    }

    /// Refresh gate.
    #[must_use]
    pub const fn gate(&self) -> &RefreshGate {
        &self.gate
    }

    /// Query cache.
    #[must_use]
    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Receive session events from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Whether the current session has been expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn remember(&self, user: &User) {
        self.store.set_user(Some(user.clone())).await;
        self.cache.set_as(keys::auth::profile(), user).await;
    }

    /// Start a session for `user`.
    pub async fn establish(&self, user: &User) {
        self.expired.store(false, Ordering::SeqCst);
        self.remember(user).await;
        tracing::info!(user_id = %user.id, "Session established");
        self.emit(SessionEvent::Established {
            user_id: user.id.clone(),
        });
    }

    /// Refresh through the gate.
    ///
    /// Exactly one caller sends the refresh; the others share its outcome.
    /// The leader applies the outcome once: a returned user is stored, a 401
    /// expires the session, other failures leave the session in place.
    pub async fn refresh<A: SessionApi>(&self, api: &A) -> RefreshOutcome {
        self.gate
            .run(|| async {
                let outcome = api.refresh_token().await;
                match &outcome {
                    Ok(user) => {
                        if let Some(user) = user {
                            self.remember(user).await;
                        }
                        tracing::info!("Session refreshed");
                        self.emit(SessionEvent::Refreshed {
                            user_id: user.as_ref().map(|u| u.id.clone()),
                        });
                    }
                    Err(SessionError::Unauthorized) => {
                        tracing::warn!("Refresh rejected by server");
                        self.expire().await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Refresh failed, keeping session");
                    }
                }
                outcome
            })
            .await
    }

    /// Re-check the session by fetching the profile.
    pub async fn verify<A: SessionApi>(&self, api: &A) -> Verification {
        tracing::debug!("Verifying session");
        match api.profile().await {
            Ok(user) => {
                self.remember(&user).await;
                tracing::debug!(user_id = %user.id, "Session verified");
                Verification::Valid(user)
            }
            Err(SessionError::Unauthorized) => {
                self.expire().await;
                Verification::Expired
            }
            Err(e) => {
                tracing::info!(error = %e, "Verification failed, assuming session is valid");
                Verification::AssumedValid(e)
            }
        }
    }

    /// End the session after the server rejected it.
    ///
    /// Logs out the store (including persisted state), clears the cache and
    /// emits [`SessionEvent::Expired`]. Only the first call per session does
    /// anything; returns whether this call did.
    pub async fn expire(&self) -> bool {
        if self.expired.swap(true, Ordering::SeqCst) {
            return false;
        }
        tracing::warn!("Session expired, signing out");
        SessionMetrics::record_expiry();
        self.store.logout().await;
        self.cache.clear().await;
        self.emit(SessionEvent::Expired {
            redirect: SESSION_EXPIRED_REDIRECT.to_string(),
        });
        true
    }

    /// Sign out at the user's request.
    pub async fn sign_out(&self) {
        self.store.logout().await;
        self.cache.clear().await;
        tracing::info!("Signed out");
        self.emit(SessionEvent::SignedOut);
    }
}
