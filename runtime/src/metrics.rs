//! Session and realtime metrics.
//!
//! Recording goes through the `metrics` facade, so nothing is collected until
//! a recorder is installed. [`MetricsRecorder::install`] installs a Prometheus
//! recorder that can be rendered on demand.
//!
//! # Example
//!
//! ```rust
//! use boxoffice_runtime::metrics::{MetricsRecorder, RefreshMetrics};
//!
//! let recorder = MetricsRecorder::install().expect("recorder");
//! RefreshMetrics::record_call();
//! if let Some(text) = recorder.render() {
//!     println!("{text}");
//! }
//! ```

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

pub use metrics::{counter, gauge};

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install the recorder
    #[error("Failed to install metrics recorder: {0}")]
    Install(String),
}

/// Installed Prometheus recorder.
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("installed", &self.handle.is_some())
            .finish()
    }
}

impl MetricsRecorder {
    /// Describe all metrics and install the global recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Install`] if installation fails for a reason
    /// other than a recorder already being installed.
    pub fn install() -> Result<Self, MetricsError> {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                describe_metrics();
                tracing::info!("Metrics recorder installed");
                Ok(Self {
                    handle: Some(handle),
                })
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, reusing it");
                    Ok(Self { handle: None })
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Current metrics in Prometheus text format.
    ///
    /// `None` when another recorder was installed first.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn describe_metrics() {
    describe_counter!(
        "session_refresh_calls_total",
        "Refresh calls actually sent to the server"
    );
    describe_counter!(
        "session_refresh_waiters_total",
        "Callers that joined an in-flight refresh instead of sending their own"
    );
    describe_counter!(
        "session_refresh_failures_total",
        "Refresh calls that failed"
    );
    describe_counter!(
        "session_refresh_abandoned_total",
        "Refreshes whose leader was cancelled"
    );
    describe_counter!("session_expired_total", "Sessions ended by the server");
    describe_counter!(
        "session_refresh_retries_total",
        "Scheduled refresh retries after non-401 failures"
    );
    describe_counter!(
        "session_refresh_gave_up_total",
        "Times the retry budget was exhausted"
    );
    describe_gauge!("session_active", "1 while a session manager loop is running");
    describe_counter!(
        "realtime_reconnects_total",
        "WebSocket reconnection attempts"
    );
    describe_counter!(
        "realtime_events_total",
        "Realtime events received, by event name"
    );
    describe_counter!("retry_attempts_total", "Request retry attempts");
    describe_counter!(
        "retry_exhausted_total",
        "Requests that failed after all attempts"
    );
}

/// Refresh gate metrics recorder.
pub struct RefreshMetrics;

impl RefreshMetrics {
    /// A refresh call was sent.
    pub fn record_call() {
        counter!("session_refresh_calls_total").increment(1);
    }

    /// A caller joined an in-flight refresh.
    pub fn record_waiter() {
        counter!("session_refresh_waiters_total").increment(1);
    }

    /// A refresh call failed.
    pub fn record_failure() {
        counter!("session_refresh_failures_total").increment(1);
    }

    /// A refresh leader was dropped mid-flight.
    pub fn record_abandoned() {
        counter!("session_refresh_abandoned_total").increment(1);
    }
}

/// Session lifecycle metrics recorder.
pub struct SessionMetrics;

impl SessionMetrics {
    /// The session expired.
    pub fn record_expiry() {
        counter!("session_expired_total").increment(1);
    }

    /// A refresh retry was scheduled.
    pub fn record_retry() {
        counter!("session_refresh_retries_total").increment(1);
    }

    /// The retry budget ran out.
    pub fn record_give_up() {
        counter!("session_refresh_gave_up_total").increment(1);
    }

    /// Manager loop running or not.
    pub fn record_active(active: bool) {
        gauge!("session_active").set(if active { 1.0 } else { 0.0 });
    }
}

/// Realtime connection metrics recorder.
pub struct RealtimeMetrics;

impl RealtimeMetrics {
    /// A reconnection attempt started.
    pub fn record_reconnect() {
        counter!("realtime_reconnects_total").increment(1);
    }

    /// An event arrived.
    pub fn record_event(event: &'static str) {
        counter!("realtime_events_total", "event" => event).increment(1);
    }
}

/// Retry metrics recorder.
pub struct RetryMetrics;

impl RetryMetrics {
    /// Record a retry attempt.
    pub fn record_attempt() {
        counter!("retry_attempts_total").increment(1);
    }

    /// Record exhausted retries.
    pub fn record_exhausted() {
        counter!("retry_exhausted_total").increment(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_install_is_repeatable() {
        let first = MetricsRecorder::install().unwrap();
        let second = MetricsRecorder::install().unwrap();
        assert!(second.render().is_none() || first.render().is_none());
    }

    #[test]
    fn test_render_includes_recorded_counters() {
        let recorder = MetricsRecorder::install().unwrap();
        RefreshMetrics::record_call();
        SessionMetrics::record_expiry();

        // Only the first installer holds the handle.
        if let Some(rendered) = recorder.render() {
            assert!(rendered.contains("session_refresh_calls_total"));
            assert!(rendered.contains("session_expired_total"));
        }
    }

    #[test]
    fn test_debug_reports_installation() {
        let recorder = MetricsRecorder::install().unwrap();
        let shown = format!("{recorder:?}");
        assert!(shown.starts_with("MetricsRecorder { installed: "));
    }
}
