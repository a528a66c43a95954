//! # Boxoffice Testing
//!
//! Testing utilities for the Boxoffice client.
//!
//! This crate provides:
//! - A fixed [`Clock`] for formatting and time-dependent code
//! - [`MockSessionApi`], a scripted session API for the session runtime
//! - [`fixtures`] with sample users, campaigns, bookings and payments
//! - [`helpers`] for tracing setup and letting background tasks run
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_testing::{MockSessionApi, fixtures};
//! use boxoffice_runtime::{SessionConfig, SessionContext, SessionManager};
//!
//! #[tokio::test(start_paused = true)]
//! async fn refreshes_on_schedule() {
//!     let api = Arc::new(MockSessionApi::new());
//!     let manager = SessionManager::new(api.clone(), Arc::default(), SessionConfig::default());
//!     manager.start(Some(fixtures::customer())).await;
//!
//!     tokio::time::sleep(Duration::from_secs(13 * 60 + 1)).await;
//!     assert_eq!(api.refresh_calls(), 1);
//! }
//! ```

use boxoffice_core::environment::Clock;
use chrono::{DateTime, Utc};

pub mod fixtures;
mod session_mock;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    pub use crate::session_mock::MockSessionApi;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use boxoffice_testing::mocks::FixedClock;
    /// use boxoffice_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Fixed clock at 2025-03-15 12:00:00 UTC
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-03-15T12:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use std::sync::Once;

    static TRACING: Once = Once::new();

    /// Install a `tracing` subscriber honouring `RUST_LOG` (default `warn`).
    ///
    /// Safe to call from every test.
    pub fn init_test_tracing() {
        TRACING.call_once(|| {
            let filter = tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_test_writer()
                .try_init();
        });
    }

    /// Yield enough times for spawned tasks to react to a wake-up.
    pub async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Amounts as the API sends them: non-negative whole shillings.
    pub fn amount() -> impl Strategy<Value = f64> {
        (0u32..50_000_000).prop_map(f64::from)
    }

    /// Plausible campaign ids.
    pub fn campaign_id() -> impl Strategy<Value = String> {
        "cmp_[a-z0-9]{4,12}"
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, MockSessionApi, test_clock};
