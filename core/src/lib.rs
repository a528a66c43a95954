//! # Boxoffice Core
//!
//! Domain types and pure helpers for the Boxoffice ticketing marketplace
//! client.
//!
//! The marketplace server owns bookings, payments, inventory and payouts.
//! This crate only describes what travels over the wire and how the client
//! checks and presents it.
//!
//! ## Modules
//!
//! - [`types`]: users, campaigns, bookings, tickets, payments and finance records
//! - [`envelope`]: the `{ success, message, data }` response envelope
//! - [`requests`]: request payloads, each implementing [`validation::Validate`]
//! - [`validation`]: field-level rule builder
//! - [`format`]: currency, date and reference formatting
//! - [`routes`]: navigation constants and the access guard
//! - [`environment`]: injected dependencies (the [`environment::Clock`])
//!
//! ## Example
//!
//! ```
//! use boxoffice_core::requests::LoginCredentials;
//! use boxoffice_core::validation::Validate;
//!
//! let credentials = LoginCredentials::new("fan@example.com", "hunt");
//! assert!(credentials.validate().is_err());
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod envelope;
pub mod format;
pub mod requests;
pub mod routes;
pub mod types;
pub mod validation;

pub use envelope::{ApiResponse, EnvelopeStatus, FieldError, Pagination};
pub use types::{Booking, Campaign, Payment, PaymentStatus, User, UserRole};
pub use validation::{Validate, ValidationError};

/// Environment module - injected dependencies
///
/// Code that needs "now" takes a [`Clock`](environment::Clock) so tests can
/// pin time.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use boxoffice_core::environment::{Clock, SystemClock};
    ///
    /// let now = SystemClock.now();
    /// assert!(now.timestamp() > 0);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
