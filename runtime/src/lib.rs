//! # Boxoffice Runtime
//!
//! Session runtime for the Boxoffice client.
//!
//! The marketplace keeps sessions in an HTTP-only cookie that lives for
//! fifteen minutes. This crate keeps that session alive and makes sure the
//! many places that can notice it expiring agree on what happens next.
//!
//! ## Core Components
//!
//! - **[`RefreshGate`]**: single-flight refresh; concurrent callers share one
//!   refresh call and its outcome
//! - **[`SessionContext`]**: auth store, gate, query cache and session events
//!   shared by the HTTP client and the manager
//! - **[`SessionManager`]**: background task for scheduled refreshes, retries
//!   and visibility/online signals
//! - **[`AuthStore`]**: observable auth state with optional persistence
//! - **[`QueryCache`]**: stale-time cache with hierarchical invalidation
//! - **[`retry`]**: exponential backoff for idempotent requests
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_runtime::{SessionConfig, SessionContext, SessionManager};
//! use std::sync::Arc;
//!
//! let context = Arc::new(SessionContext::default());
//! let manager = SessionManager::new(api, Arc::clone(&context), SessionConfig::default());
//!
//! manager.start(Some(user)).await;
//!
//! let mut events = context.subscribe();
//! while let Ok(event) = events.recv().await {
//!     // Navigate to the login page on SessionEvent::Expired
//! }
//! ```

/// Hierarchical query cache
pub mod cache;

/// Shared session state and lifecycle events
pub mod context;

/// Error types for the session runtime
pub mod error;

/// Metrics for refreshes, sessions and realtime connections
pub mod metrics;

/// Single-flight refresh gate
pub mod refresh;

/// Retry logic with exponential backoff
pub mod retry;

/// Background session manager
pub mod session;

/// Observable auth state
pub mod store;

pub use cache::{QueryCache, QueryKey, keys};
pub use context::{SessionContext, SessionEvent, Verification};
pub use error::{PersistError, SessionConfigError, SessionError};
pub use refresh::{RefreshGate, RefreshOutcome};
pub use retry::{RetryPolicy, retry_if, retry_with_backoff};
pub use session::{SessionApi, SessionConfig, SessionManager, SessionSignal, SessionStatus};
pub use store::{AuthState, AuthStore};
