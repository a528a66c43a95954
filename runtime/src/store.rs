//! Client-side auth state with change notification and optional persistence.
//!
//! The store starts in a loading state. Subscribers get a
//! [`watch::Receiver`] and see every change as a fresh [`AuthState`]
//! snapshot.
//!
//! When persistence is enabled only `user` and `is_authenticated` are
//! written, as `{"state": {...}, "version": 0}` in `auth-storage.json`.

use crate::error::PersistError;
use boxoffice_core::User;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Storage name of the persisted document.
pub const STORAGE_NAME: &str = "auth-storage";

/// Snapshot of the auth state.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    /// Signed-in user.
    pub user: Option<User>,
    /// `user.is_some()`.
    pub is_authenticated: bool,
    /// Whether the session is still being determined.
    pub is_loading: bool,
    /// Whether persisted state has been loaded.
    pub is_hydrated: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
            is_hydrated: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedAuth {
    user: Option<User>,
    is_authenticated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedDocument {
    state: PersistedAuth,
    #[serde(default)]
    version: u32,
}

/// Auth state holder.
#[derive(Debug)]
pub struct AuthStore {
    state: watch::Sender<AuthState>,
    storage: Option<PathBuf>,
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl AuthStore {
    /// Store without persistence.
    #[must_use]
    pub fn in_memory() -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            state,
            storage: None,
        }
    }

    /// Store persisted to `auth-storage.json` inside `dir`.
    #[must_use]
    pub fn persistent(dir: impl AsRef<Path>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            state,
            storage: Some(dir.as_ref().join(format!("{STORAGE_NAME}.json"))),
        }
    }

    /// File backing this store, if any.
    #[must_use]
    pub fn storage_path(&self) -> Option<&Path> {
        self.storage.as_deref()
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Signed-in user.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    /// Observe changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Replace the user and stop loading.
    pub async fn set_user(&self, user: Option<User>) {
        self.state.send_modify(|state| {
            state.is_authenticated = user.is_some();
            state.user = user;
            state.is_loading = false;
        });
        self.save().await;
    }

    /// Set the loading flag.
    pub fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|state| {
            let changed = state.is_loading != loading;
            state.is_loading = loading;
            changed
        });
    }

    /// Sign out locally and delete persisted state.
    pub async fn logout(&self) {
        self.clear_auth();
        if let Some(path) = &self.storage {
            match tokio::fs::remove_file(path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed persisted auth state"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove persisted auth state");
                }
            }
        }
    }

    /// Sign out locally without touching persisted state.
    pub fn clear_auth(&self) {
        self.state.send_modify(|state| {
            state.user = None;
            state.is_authenticated = false;
            state.is_loading = false;
        });
    }

    /// Mark persisted state as loaded.
    pub fn mark_hydrated(&self) {
        self.state.send_if_modified(|state| {
            let changed = !state.is_hydrated;
            state.is_hydrated = true;
            changed
        });
    }

    /// Load persisted state, then mark the store hydrated.
    ///
    /// A missing file hydrates to the empty state. A corrupt file is logged
    /// and ignored.
    pub async fn hydrate(&self) {
        if let Some(path) = &self.storage {
            match load(path).await {
                Ok(Some(saved)) => {
                    tracing::debug!(
                        authenticated = saved.is_authenticated,
                        "Hydrated auth state"
                    );
                    self.state.send_modify(|state| {
                        state.is_authenticated = saved.is_authenticated && saved.user.is_some();
                        state.user = saved.user;
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable auth state");
                }
            }
        }
        self.mark_hydrated();
    }

    async fn save(&self) {
        let Some(path) = &self.storage else {
            return;
        };
        let document = {
            let state = self.state.borrow();
            PersistedDocument {
                state: PersistedAuth {
                    user: state.user.clone(),
                    is_authenticated: state.is_authenticated,
                },
                version: 0,
            }
        };
        if let Err(e) = write(path, &document).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to persist auth state");
        }
    }
}

async fn load(path: &Path) -> Result<Option<PersistedAuth>, PersistError> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let document: PersistedDocument = serde_json::from_slice(&raw)?;
    Ok(Some(document.state))
}

async fn write(path: &Path, document: &PersistedDocument) -> Result<(), PersistError> {
    let bytes = serde_json::to_vec(document)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
