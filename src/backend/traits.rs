//! Backend traits: the two remote collaborators the site core talks to.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::session::SessionUser;
use crate::error::{IdentityError, StoreError};
use crate::leads::model::Inquiry;

/// Proof of an authenticated identity, as issued by the identity backend.
#[derive(Debug, Clone)]
pub struct BackendSession {
    pub user: SessionUser,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl BackendSession {
    /// Whether the token expires within `margin` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        self.expires_at.is_some_and(|at| at - now <= margin)
    }
}

/// Out-of-band session notification published by the identity backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn(SessionUser),
    TokenRefreshed(SessionUser),
    /// Sign-out, expiry, or backend-side invalidation.
    SignedOut,
}

impl SessionChange {
    /// The user this change leaves signed in, if any.
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::SignedIn(u) | Self::TokenRefreshed(u) => Some(u),
            Self::SignedOut => None,
        }
    }
}

/// Account and session operations.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Create an account and sign the new user in.
    ///
    /// `None` means the account exists but the backend withholds a session
    /// until the email address is confirmed.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Option<BackendSession>, IdentityError>;

    /// Verify credentials and issue a session.
    async fn authenticate(&self, email: &str, password: &str)
    -> Result<BackendSession, IdentityError>;

    /// Drop the current session. Local state is cleared even if the remote call fails.
    async fn invalidate_session(&self) -> Result<(), IdentityError>;

    /// Dispatch a password-reset link to `email`.
    async fn request_password_reset(&self, email: &str) -> Result<(), IdentityError>;

    /// The session currently held, if any.
    async fn current_session(&self) -> Result<Option<BackendSession>, IdentityError>;

    /// Subscribe to session changes (refresh, expiry, sign-in/out).
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;
}

/// Insert-only storage for inquiries.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Persist one inquiry.
    ///
    /// Returns the server-assigned id when the store is allowed to report it.
    async fn insert_inquiry(&self, inquiry: &Inquiry) -> Result<Option<Uuid>, StoreError>;
}
