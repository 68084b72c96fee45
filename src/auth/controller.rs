//! SessionController: owns the `AuthSession` and mediates credential
//! operations against the identity backend.
//!
//! The session lives in a `watch` channel: this controller is the only
//! writer, while the navigation, route guard and modal read it.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use super::session::AuthSession;
use super::validation::{validate_email, validate_password};
use crate::backend::{IdentityBackend, SessionChange};
use crate::error::{AuthError, IdentityError, ValidationError};

/// Fallback when the backend gives no message.
pub const GENERIC_FAILURE: &str = "An error occurred. Please try again.";
/// Fallback for a failed reset-link dispatch without a backend message.
pub const RESET_FAILURE: &str = "Failed to send reset email";

/// Owns the client-side session.
pub struct SessionController {
    backend: Arc<dyn IdentityBackend>,
    session: watch::Sender<AuthSession>,
}

impl SessionController {
    /// Create a controller in the `Loading` state. Call [`initialize`](Self::initialize) next.
    pub fn new(backend: Arc<dyn IdentityBackend>) -> Arc<Self> {
        let (session, _rx) = watch::channel(AuthSession::loading());
        Arc::new(Self { backend, session })
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> AuthSession {
        self.session.borrow().clone()
    }

    /// Watch the session. The receiver sees every write made after subscribing.
    pub fn subscribe(&self) -> watch::Receiver<AuthSession> {
        self.session.subscribe()
    }

    /// Resolve the initial `Loading` state by asking the backend for an existing session.
    ///
    /// A backend failure resolves to `Unauthenticated`; the site stays usable.
    pub async fn initialize(&self) -> AuthSession {
        let resolved = match self.backend.current_session().await {
            Ok(Some(session)) => AuthSession::authenticated(session.user),
            Ok(None) => AuthSession::unauthenticated(),
            Err(e) => {
                warn!(error = %e, "Could not resolve existing session");
                AuthSession::unauthenticated()
            }
        };
        self.set(resolved.clone(), "initialize");
        resolved
    }

    /// Create an account and sign in.
    ///
    /// If the backend withholds the session until the email is confirmed, the
    /// call still succeeds and the session stays unauthenticated.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthSession, AuthError> {
        validate_email(email)?;
        validate_password(password)?;
        if display_name.trim().is_empty() {
            return Err(ValidationError::MissingName.into());
        }

        match self
            .backend
            .create_account(email, password, display_name.trim())
            .await
        {
            Ok(Some(session)) => {
                info!(email = %email, "Signed up");
                let next = AuthSession::authenticated(session.user);
                self.set(next.clone(), "sign_up");
                Ok(next)
            }
            Ok(None) => {
                info!(email = %email, "Signed up; confirmation pending");
                Ok(self.session())
            }
            Err(e) => Err(classify(e, GENERIC_FAILURE)),
        }
    }

    /// Verify credentials and sign in.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        validate_email(email)?;
        validate_password(password)?;

        let session = self
            .backend
            .authenticate(email, password)
            .await
            .map_err(|e| classify(e, GENERIC_FAILURE))?;

        info!(email = %email, "Signed in");
        let next = AuthSession::authenticated(session.user);
        self.set(next.clone(), "sign_in");
        Ok(next)
    }

    /// Sign out unconditionally. A failed remote call is logged, never surfaced.
    pub async fn sign_out(&self) {
        if let Err(e) = self.backend.invalidate_session().await {
            warn!(error = %e, "Remote sign-out failed; clearing local session anyway");
        }
        self.set(AuthSession::unauthenticated(), "sign_out");
    }

    /// Ask the backend to email a reset link. Never changes the session.
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        validate_email(email)?;
        self.backend
            .request_password_reset(email)
            .await
            .map_err(|e| classify(e, RESET_FAILURE))?;
        info!(email = %email, "Password reset link requested");
        Ok(())
    }

    /// Merge a backend notification into the session. Last writer wins.
    pub fn apply_change(&self, change: &SessionChange) {
        let next = match change.user() {
            Some(user) => AuthSession::authenticated(user.clone()),
            None => AuthSession::unauthenticated(),
        };
        self.set(next, "backend_change");
    }

    /// Spawn a task merging backend session notifications into the session.
    pub fn spawn_change_listener(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let mut rx = self.backend.subscribe();
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => controller.apply_change(&change),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "Session listener lagged; re-reading session");
                        controller.initialize().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Session change channel closed");
                        break;
                    }
                }
            }
        })
    }

    fn set(&self, next: AuthSession, source: &'static str) {
        let previous = self.session.send_replace(next);
        let current = self.session.borrow();
        if previous.status != current.status {
            info!(
                from = %previous.status,
                to = %current.status,
                source,
                "Session status changed"
            );
        }
    }
}

/// Classify a backend failure into the user-facing outcome.
fn classify(err: IdentityError, fallback: &str) -> AuthError {
    match err {
        IdentityError::AlreadyRegistered => AuthError::AlreadyRegistered,
        IdentityError::InvalidCredentials => AuthError::InvalidCredentials,
        other if other.is_permanent() => {
            error!(error = %other, "Identity backend unusable");
            AuthError::Unconfigured
        }
        other => {
            warn!(error = %other, "Identity backend call failed");
            AuthError::Backend(
                other
                    .backend_message()
                    .map(String::from)
                    .unwrap_or_else(|| fallback.to_string()),
            )
        }
    }
}
