//! Route guarding and navigation intent.
//!
//! A protected view asks [`guard`] what to do for the current session. The
//! incoming navigation intent (`?auth=signin&redirect=/dashboard`) is mapped
//! once, at entry, into the auth modal's initial state.

use serde::{Deserialize, Serialize};

use super::form::{AuthFormState, AuthMode};
use super::session::{AuthSession, AuthStatus};

/// Public landing route unauthenticated visitors are sent to.
pub const PUBLIC_LANDING: &str = "/";

/// Requested auth modal mode plus where to go after authenticating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIntent {
    pub mode: AuthMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_to: Option<String>,
}

/// Raw navigation parameters as they arrive on the query string.
#[derive(Debug, Default, Deserialize)]
pub struct IntentQuery {
    pub auth: Option<String>,
    pub redirect: Option<String>,
}

impl AuthIntent {
    /// Sign-in intent returning to `path`.
    pub fn sign_in_then(path: &str) -> Self {
        Self {
            mode: AuthMode::SignIn,
            return_to: site_path(path),
        }
    }

    /// Map navigation parameters to an intent. `None` when no modal was requested.
    ///
    /// Return targets must be site-relative; anything else is dropped.
    pub fn from_query(query: &IntentQuery) -> Option<Self> {
        let mode = AuthMode::from_param(query.auth.as_deref()?)?;
        Some(Self {
            mode,
            return_to: query.redirect.as_deref().and_then(site_path),
        })
    }

    /// Initial state of the auth modal opened for this intent.
    pub fn initial_form(&self) -> AuthFormState {
        AuthFormState::new(self.mode)
    }
}

/// Accept `/path` but not `//host` or absolute URLs.
fn site_path(path: &str) -> Option<String> {
    let path = path.trim();
    if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') {
        Some(path.to_string())
    } else {
        None
    }
}

/// What a protected view should do for the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RouteDecision {
    /// Session still loading: render nothing, do not redirect yet.
    Pending,
    Render,
    Redirect { to: String, intent: AuthIntent },
}

/// Decide how the protected view at `requested` handles `session`.
pub fn guard(session: &AuthSession, requested: &str) -> RouteDecision {
    match session.status {
        AuthStatus::Loading => RouteDecision::Pending,
        AuthStatus::Authenticated => RouteDecision::Render,
        AuthStatus::Unauthenticated => RouteDecision::Redirect {
            to: PUBLIC_LANDING.to_string(),
            intent: AuthIntent::sign_in_then(requested),
        },
    }
}
