//! Error types for Agent Studio.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures reported by the identity backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("User already registered")]
    AlreadyRegistered,

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Identity backend is not configured")]
    Unconfigured,

    #[error("Identity backend rejected the request: {message}")]
    Rejected { message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl IdentityError {
    /// Whether this failure can never succeed on a later attempt.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Unconfigured)
    }

    /// The backend-provided message, if the failure carried one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message } | Self::Transport(message) if !message.is_empty() => {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}

/// Wizard registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("Wizard not found: {0}")]
    NotFound(uuid::Uuid),
}

/// Lead-storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Lead store is not configured")]
    Unconfigured,

    #[error("Lead store rejected the insert: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl StoreError {
    /// Whether this failure can never succeed on a later attempt.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Unconfigured)
    }
}

/// Input validation failures, caught before any backend call.
///
/// `Display` is the exact message shown next to the form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password must be at least 8 characters")]
    PasswordTooShort,

    #[error("Please enter your full name")]
    MissingName,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Please fill in the required field: {0}")]
    MissingField(&'static str),
}

/// Classified failure of a session operation, as surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("This email is already registered")]
    AlreadyRegistered,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication is not configured")]
    Unconfigured,

    /// Backend message passed through, or the operation's generic fallback.
    #[error("{0}")]
    Backend(String),
}

impl AuthError {
    /// User-facing message for this failure.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Whether the failure happened before the backend was contacted.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_user_facing() {
        assert_eq!(
            ValidationError::InvalidEmail.to_string(),
            "Please enter a valid email address"
        );
        assert_eq!(
            ValidationError::PasswordTooShort.to_string(),
            "Password must be at least 8 characters"
        );
        assert_eq!(
            AuthError::from(ValidationError::PasswordMismatch).user_message(),
            "Passwords do not match"
        );
    }

    #[test]
    fn backend_message_only_when_present() {
        let e = IdentityError::Rejected {
            message: "rate limited".into(),
        };
        assert_eq!(e.backend_message(), Some("rate limited"));

        let empty = IdentityError::Rejected {
            message: String::new(),
        };
        assert_eq!(empty.backend_message(), None);
        assert_eq!(IdentityError::InvalidCredentials.backend_message(), None);
    }

    #[test]
    fn unconfigured_is_permanent() {
        assert!(IdentityError::Unconfigured.is_permanent());
        assert!(!IdentityError::Transport("reset".into()).is_permanent());
        assert!(StoreError::Unconfigured.is_permanent());
        assert!(!StoreError::Rejected("nope".into()).is_permanent());
    }
}
