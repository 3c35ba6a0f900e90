//! Collaborator interfaces the gate is wired to.
//!
//! The gate never talks to a concrete backend or navigation library; callers
//! inject implementations of these traits when building a
//! [`ProfileGate`](crate::ProfileGate).

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::session::{AuthChange, Session, UserId};

/// Remote authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// One-shot lookup of the session persisted on this device, if any.
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Subscribes to login, logout and token refresh notifications.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}

/// The completeness column of a profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileCompletion {
    /// `None` when the row exists but the flag was never written.
    pub is_profile_complete: Option<bool>,
}

impl ProfileCompletion {
    pub fn is_complete(&self) -> bool {
        self.is_profile_complete.unwrap_or(false)
    }
}

/// Single-row lookup of a user's completeness flag.
#[async_trait]
pub trait ProfileCompletionSource: Send + Sync {
    /// Returns `Ok(None)` when the user has no profile row.
    async fn fetch_profile_completion(&self, user_id: &UserId)
        -> Result<Option<ProfileCompletion>>;
}

/// Screen router. Navigation to the gate's fixed destinations is assumed to
/// succeed.
#[cfg_attr(test, mockall::automock)]
pub trait Router: Send + Sync {
    /// Path currently displayed, e.g. `/login`.
    fn current_path(&self) -> String;

    /// Navigates to `path` without leaving a back-entry.
    fn replace(&self, path: &str);
}
