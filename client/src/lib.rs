//! # Boxoffice Client
//!
//! Rust client library for the Boxoffice ticketing marketplace API.
//!
//! Sessions live in an HTTP-only cookie. Every request goes through a 401
//! interceptor: the first expired request refreshes the session, requests
//! that fail while the refresh is in flight wait for it, and all of them are
//! replayed once. When the refresh itself is rejected the session is
//! expired and a login redirect is emitted on the session event channel.
//!
//! ## Example
//!
//! ```no_run
//! use boxoffice_client::{ApiClient, ClientConfig};
//! use boxoffice_core::requests::LoginCredentials;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Read BOXOFFICE_* settings from the environment
//!     let config = ClientConfig::from_env()?;
//!     let client = ApiClient::new(&config)?;
//!
//!     let credentials = LoginCredentials::new("amara@example.com", "secret123");
//!     let landing = client.auth().sign_in(&credentials).await?;
//!     println!("Signed in, going to {}", landing.route);
//!
//!     let featured = client.campaigns().featured(None).await?;
//!     println!("{} featured campaigns", featured.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - Single-flight session refresh with one replay per request
//! - Endpoint groups for auth, campaigns, bookings, payments and finance
//! - Client-side validation before anything is sent
//! - Query cache with invalidation on writes and realtime events
//! - Payment gateway callback handling
//! - Realtime WebSocket updates with reconnection

pub mod api;
pub mod callback;
pub mod config;
pub mod error;
pub mod http;
pub mod realtime;

// Re-export main types for convenience
pub use api::{AuthApi, BookingsApi, CampaignsApi, FinanceApi, Landing, PaymentsApi};
pub use callback::{CallbackOutcome, CallbackParams, process_callback};
pub use config::{ClientConfig, ConfigError, RealtimeConfig};
pub use error::ApiError;
pub use http::{ApiClient, ApiRequest};
pub use realtime::{ConnectionState, RealtimeClient, RealtimeError, RealtimeEvent};
