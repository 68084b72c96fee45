//! Session model: what the rest of the site reads to decide what to show.

use serde::{Deserialize, Serialize};

/// Lifecycle of the client-side session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// Transient state before the backend has been asked for an existing session.
    Loading,
    Authenticated,
    Unauthenticated,
}

impl Default for AuthStatus {
    fn default() -> Self {
        Self::Loading
    }
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Loading => "loading",
            Self::Authenticated => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        };
        write!(f, "{s}")
    }
}

/// The signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl SessionUser {
    /// Name shown in the user menu: display name, else the email's local part,
    /// else `"User"`.
    pub fn menu_name(&self) -> String {
        if let Some(name) = self.display_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                return name.to_string();
            }
        }
        match self.email.split('@').next() {
            Some(local) if !local.is_empty() => local.to_string(),
            _ => "User".to_string(),
        }
    }

    /// Up to two uppercase initials of the menu name.
    pub fn initials(&self) -> String {
        self.menu_name()
            .split_whitespace()
            .filter_map(|w| w.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// Client-side session state.
///
/// Once initialization completes, `status` is exactly one of `Authenticated`
/// (with a user) or `Unauthenticated` (without one).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: Option<SessionUser>,
    pub status: AuthStatus,
}

impl AuthSession {
    pub fn loading() -> Self {
        Self::default()
    }

    pub fn authenticated(user: SessionUser) -> Self {
        Self {
            user: Some(user),
            status: AuthStatus::Authenticated,
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            user: None,
            status: AuthStatus::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.status == AuthStatus::Loading
    }
}
