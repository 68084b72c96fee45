//! Auth form state machine: mode, fields and submission state of one modal.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::validation::{validate_email, validate_sign_in, validate_sign_up};
use crate::error::ValidationError;

/// Which form the modal shows.
///
/// Transitions: SignIn ⇄ SignUp, SignIn → Forgot, Forgot → SignIn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    SignIn,
    SignUp,
    Forgot,
}

impl AuthMode {
    /// Check if the user may switch from `self` to `target`.
    pub fn can_switch_to(&self, target: AuthMode) -> bool {
        use AuthMode::*;
        matches!(
            (self, target),
            (SignIn, SignUp) | (SignUp, SignIn) | (SignIn, Forgot) | (Forgot, SignIn)
        )
    }

    /// Parse the `auth=` navigation parameter. Only sign-in and sign-up can be requested.
    pub fn from_param(param: &str) -> Option<Self> {
        match param {
            "signin" => Some(Self::SignIn),
            "signup" => Some(Self::SignUp),
            _ => None,
        }
    }
}

impl Default for AuthMode {
    fn default() -> Self {
        Self::SignIn
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::SignIn => "signin",
            Self::SignUp => "signup",
            Self::Forgot => "forgot",
        };
        write!(f, "{s}")
    }
}

/// Input fields of the auth form.
#[derive(Debug)]
pub struct AuthFields {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl Default for AuthFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            password: SecretString::from(""),
            confirm_password: SecretString::from(""),
        }
    }
}

/// Field identifiers for [`AuthFormState::set_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Name,
    Email,
    Password,
    ConfirmPassword,
}

/// Submission lifecycle of one form instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum Submission {
    Idle,
    Submitting,
    Success(String),
    Error(String),
}

impl Default for Submission {
    fn default() -> Self {
        Self::Idle
    }
}

/// Transient state of one auth modal instance.
#[derive(Debug, Default)]
pub struct AuthFormState {
    pub mode: AuthMode,
    pub fields: AuthFields,
    pub submission: Submission,
}

impl AuthFormState {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Switch mode if the transition is allowed. Messages are cleared.
    pub fn switch_mode(&mut self, target: AuthMode) -> bool {
        if !self.mode.can_switch_to(target) || self.is_submitting() {
            return false;
        }
        self.mode = target;
        self.submission = Submission::Idle;
        true
    }

    /// Update a field. Editing clears a previous error message.
    pub fn set_field(&mut self, field: AuthField, value: impl Into<String>) {
        let value = value.into();
        match field {
            AuthField::Name => self.fields.name = value,
            AuthField::Email => self.fields.email = value,
            AuthField::Password => self.fields.password = SecretString::from(value),
            AuthField::ConfirmPassword => self.fields.confirm_password = SecretString::from(value),
        }
        if matches!(self.submission, Submission::Error(_)) {
            self.submission = Submission::Idle;
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submission == Submission::Submitting
    }

    /// Validate the fields that matter in the current mode.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let f = &self.fields;
        match self.mode {
            AuthMode::Forgot => validate_email(&f.email),
            AuthMode::SignIn => validate_sign_in(&f.email, f.password.expose_secret()),
            AuthMode::SignUp => validate_sign_up(
                &f.name,
                &f.email,
                f.password.expose_secret(),
                f.confirm_password.expose_secret(),
            ),
        }
    }

    /// Clear fields and messages and return to `mode`.
    pub fn reset(&mut self, mode: AuthMode) {
        *self = Self::new(mode);
    }
}
