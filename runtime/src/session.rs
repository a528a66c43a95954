//! Background session keeper.
//!
//! Once started for a user, the manager verifies the session, then runs a
//! task that:
//!
//! - refreshes every `lifetime - refresh_buffer` (13 minutes by default),
//! - retries failed refreshes after a fixed delay, giving up after
//!   `max_retry_attempts` until the next scheduled cycle,
//! - reacts to [`SessionSignal`]s from the host application when more than
//!   half the lifetime has passed since the last refresh,
//! - stops when the session expires, however that was detected.
//!
//! Only a 401 ends a session. Network and server errors keep the user signed
//! in.

use crate::context::{SessionContext, SessionEvent, Verification};
use crate::error::{SessionConfigError, SessionError};
use crate::metrics::SessionMetrics;
use crate::refresh::RefreshOutcome;
use boxoffice_core::User;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Server calls the session runtime needs.
///
/// # Implementation Notes
///
/// Implementations map an HTTP 401 to [`SessionError::Unauthorized`]; that
/// is the only error that ends a session.
pub trait SessionApi: Send + Sync + 'static {
    /// Ask the server to extend the session. Returns the user when the
    /// server includes it.
    fn refresh_token(&self) -> impl Future<Output = RefreshOutcome> + Send;

    /// Fetch the signed-in user's profile.
    fn profile(&self) -> impl Future<Output = Result<User, SessionError>> + Send;
}

/// Session timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Server-side session lifetime.
    pub lifetime: Duration,
    /// How long before expiry to refresh.
    pub refresh_buffer: Duration,
    /// Failed refreshes tolerated per cycle.
    pub max_retry_attempts: u32,
    /// Wait between a failed refresh and its retry.
    pub retry_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime: Duration::from_secs(15 * 60),
            refresh_buffer: Duration::from_secs(2 * 60),
            max_retry_attempts: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl SessionConfig {
    /// Timing for a session of `lifetime`, refreshed `refresh_buffer` early.
    ///
    /// # Errors
    ///
    /// Returns [`SessionConfigError`] if the buffer is not shorter than the
    /// lifetime.
    pub fn new(lifetime: Duration, refresh_buffer: Duration) -> Result<Self, SessionConfigError> {
        let config = Self {
            lifetime,
            refresh_buffer,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the retry policy.
    #[must_use]
    pub const fn with_retries(mut self, max_attempts: u32, delay: Duration) -> Self {
        self.max_retry_attempts = max_attempts;
        self.retry_delay = delay;
        self
    }

    /// Check the timing is usable.
    ///
    /// # Errors
    ///
    /// Returns [`SessionConfigError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), SessionConfigError> {
        if self.lifetime.is_zero() {
            return Err(SessionConfigError::ZeroLifetime);
        }
        if self.refresh_buffer >= self.lifetime {
            return Err(SessionConfigError::BufferTooLarge {
                buffer: self.refresh_buffer,
                lifetime: self.lifetime,
            });
        }
        if self.max_retry_attempts == 0 {
            return Err(SessionConfigError::ZeroRetries);
        }
        Ok(())
    }

    /// Period of the scheduled refresh.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.lifetime.saturating_sub(self.refresh_buffer)
    }

    /// Idle time after which a signal triggers a refresh or verification.
    #[must_use]
    pub fn reactivation_threshold(&self) -> Duration {
        self.lifetime / 2
    }
}

/// Environment changes reported by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// The application became visible again.
    Visible,
    /// Network connectivity was restored.
    Online,
}

/// Observable manager state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    /// Whether the background task is running.
    pub active: bool,
    /// User the manager was started for.
    pub user_id: Option<String>,
    /// Last successful refresh (or verification at start).
    pub last_refresh: Option<Instant>,
    /// Consecutive failed refreshes in the current cycle.
    pub retry_count: u32,
    /// Whether a refresh is in flight.
    pub refreshing: bool,
}

struct Running {
    user_id: String,
    signals: mpsc::Sender<SessionSignal>,
    // Dropping the sender also stops the task.
    _shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Running {
    async fn stop(self) {
        self.handle.abort();
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                tracing::warn!(error = %e, "Session task ended abnormally");
            }
        }
    }
}

/// Keeps a session alive in the background.
pub struct SessionManager<A: SessionApi> {
    api: Arc<A>,
    context: Arc<SessionContext>,
    config: SessionConfig,
    status: Arc<watch::Sender<SessionStatus>>,
    running: Mutex<Option<Running>>,
}

impl<A: SessionApi> SessionManager<A> {
    /// Manager over `api` sharing `context` with the HTTP client.
    #[must_use]
    pub fn new(api: Arc<A>, context: Arc<SessionContext>, config: SessionConfig) -> Self {
        let (status, _) = watch::channel(SessionStatus::default());
        Self {
            api,
            context,
            config,
            status: Arc::new(status),
            running: Mutex::new(None),
        }
    }

    /// Shared context.
    #[must_use]
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Timing in use.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current state.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        let mut status = self.status.borrow().clone();
        status.refreshing = self.context.gate().is_refreshing();
        status
    }

    /// Observe state changes.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Start keeping `user`'s session alive.
    ///
    /// Without a user the manager stays inactive. Starting again for the
    /// user already being managed is a no-op; any other user replaces the
    /// current one. A 401 while verifying expires the session and leaves
    /// the manager inactive; any other verification failure is ignored.
    pub async fn start(&self, user: Option<User>) -> SessionStatus {
        let mut running = self.running.lock().await;

        let Some(user) = user else {
            if let Some(previous) = running.take() {
                tracing::info!(user_id = %previous.user_id, "User signed out, stopping session manager");
                previous.stop().await;
                self.mark_inactive();
            }
            self.context.store().set_loading(false);
            tracing::debug!("No user, session manager inactive");
            return self.status();
        };

        if let Some(current) = running.as_ref() {
            if current.user_id == user.id && !current.handle.is_finished() {
                return self.status();
            }
        }
        if let Some(previous) = running.take() {
            previous.stop().await;
            self.mark_inactive();
        }

        tracing::info!(user_id = %user.id, "Initializing session");
        self.context.establish(&user).await;

        if let Verification::Expired = self.context.verify(&*self.api).await {
            tracing::info!(user_id = %user.id, "Initial verification rejected");
            self.context.store().set_loading(false);
            return self.status();
        }

        let now = Instant::now();
        self.status.send_modify(|status| {
            status.active = true;
            status.user_id = Some(user.id.clone());
            status.last_refresh = Some(now);
            status.retry_count = 0;
        });
        SessionMetrics::record_active(true);

        let (signals_tx, signals_rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = SessionTask {
            api: Arc::clone(&self.api),
            context: Arc::clone(&self.context),
            config: self.config.clone(),
            status: Arc::clone(&self.status),
            last_refresh: now,
            retry_count: 0,
            retry_at: None,
        };
        let events = self.context.subscribe();
        let handle = tokio::spawn(task.run(signals_rx, shutdown_rx, events));

        tracing::info!(
            user_id = %user.id,
            interval_secs = self.config.refresh_interval().as_secs(),
            "Session auto-refresh scheduled"
        );
        *running = Some(Running {
            user_id: user.id,
            signals: signals_tx,
            _shutdown: shutdown_tx,
            handle,
        });
        self.context.store().set_loading(false);
        self.status()
    }

    /// Forward an environment change to the running task.
    ///
    /// Returns `false` when no task is running.
    pub async fn signal(&self, signal: SessionSignal) -> bool {
        let running = self.running.lock().await;
        match running.as_ref() {
            Some(current) => current.signals.try_send(signal).is_ok(),
            None => false,
        }
    }

    /// Cancel timers and the background task. Safe to call repeatedly.
    pub async fn stop(&self) {
        let previous = self.running.lock().await.take();
        if let Some(previous) = previous {
            tracing::info!(user_id = %previous.user_id, "Stopping session manager");
            previous.stop().await;
        }
        self.mark_inactive();
    }

    fn mark_inactive(&self) {
        self.status.send_if_modified(|status| {
            let changed = status.active;
            status.active = false;
            status.retry_count = 0;
            changed
        });
        SessionMetrics::record_active(false);
    }
}

enum Flow {
    Continue,
    Stop,
}

struct SessionTask<A: SessionApi> {
    api: Arc<A>,
    context: Arc<SessionContext>,
    config: SessionConfig,
    status: Arc<watch::Sender<SessionStatus>>,
    last_refresh: Instant,
    retry_count: u32,
    retry_at: Option<Instant>,
}

impl<A: SessionApi> SessionTask<A> {
    async fn run(
        mut self,
        mut signals: mpsc::Receiver<SessionSignal>,
        mut shutdown: oneshot::Receiver<()>,
        mut events: broadcast::Receiver<SessionEvent>,
    ) {
        let period = self.config.refresh_interval();
        let mut ticker = tokio::time::interval_at(self.last_refresh + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let retry_at = self.retry_at;
            let retry = async move {
                match retry_at {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            let flow = tokio::select! {
                _ = &mut shutdown => Flow::Stop,
                _ = ticker.tick() => {
                    tracing::debug!("Scheduled refresh triggered");
                    self.refresh().await
                }
                () = retry => {
                    self.retry_at = None;
                    tracing::debug!(attempt = self.retry_count, "Retrying refresh");
                    self.refresh().await
                }
                Some(signal) = signals.recv() => self.on_signal(signal).await,
                event = events.recv() => match event {
                    Ok(SessionEvent::Expired { .. }) | Err(broadcast::error::RecvError::Closed) => Flow::Stop,
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => Flow::Continue,
                },
            };

            if matches!(flow, Flow::Stop) {
                break;
            }
        }

        self.status.send_modify(|status| {
            status.active = false;
            status.retry_count = 0;
        });
        SessionMetrics::record_active(false);
        tracing::info!("Session task stopped");
    }

    async fn refresh(&mut self) -> Flow {
        match self.context.refresh(&*self.api).await {
            Ok(_) => {
                self.retry_count = 0;
                self.retry_at = None;
                self.last_refresh = Instant::now();
                let last = self.last_refresh;
                self.status.send_modify(|status| {
                    status.last_refresh = Some(last);
                    status.retry_count = 0;
                });
                Flow::Continue
            }
            Err(SessionError::Unauthorized) => {
                self.context.expire().await;
                Flow::Stop
            }
            Err(e) => {
                self.retry_count += 1;
                let max = self.config.max_retry_attempts;
                if self.retry_count >= max {
                    tracing::error!(error = %e, attempts = max, "Max refresh retry attempts reached");
                    SessionMetrics::record_give_up();
                    self.retry_count = 0;
                    self.retry_at = None;
                } else {
                    tracing::warn!(
                        error = %e,
                        retry = self.retry_count,
                        max,
                        delay_secs = self.config.retry_delay.as_secs(),
                        "Refresh failed, retry scheduled"
                    );
                    SessionMetrics::record_retry();
                    self.retry_at = Some(Instant::now() + self.config.retry_delay);
                }
                let count = self.retry_count;
                self.status.send_modify(|status| status.retry_count = count);
                Flow::Continue
            }
        }
    }

    async fn on_signal(&mut self, signal: SessionSignal) -> Flow {
        let idle = self.last_refresh.elapsed();
        if idle <= self.config.reactivation_threshold() {
            tracing::debug!(?signal, idle_secs = idle.as_secs(), "Session recently refreshed, ignoring signal");
            return Flow::Continue;
        }
        match signal {
            SessionSignal::Visible => {
                tracing::info!(idle_secs = idle.as_secs(), "Returned after long absence, refreshing");
                self.refresh().await
            }
            SessionSignal::Online => {
                tracing::info!("Connection restored, verifying session");
                match self.context.verify(&*self.api).await {
                    Verification::Expired => Flow::Stop,
                    Verification::Valid(_) | Verification::AssumedValid(_) => Flow::Continue,
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing() {
        let config = SessionConfig::default();
        assert_eq!(config.refresh_interval(), Duration::from_secs(13 * 60));
        assert_eq!(config.reactivation_threshold(), Duration::from_secs(450));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_buffer_must_be_shorter_than_lifetime() {
        let err = SessionConfig::new(Duration::from_secs(60), Duration::from_secs(60)).unwrap_err();
        assert!(matches!(err, SessionConfigError::BufferTooLarge { .. }));
        assert_eq!(
            SessionConfig::default().with_retries(0, Duration::ZERO).validate(),
            Err(SessionConfigError::ZeroRetries)
        );
    }
}
