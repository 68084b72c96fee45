//! AuthModal: drives one auth form against the session controller.
//!
//! Enforces a single in-flight submission and schedules the timed
//! transitions: back to sign-in after a reset link is sent, and closing
//! after a successful sign-in or sign-up. Closing the modal voids any
//! transition scheduled before it, and a request still in flight at
//! close time neither unblocks the busy guard nor writes its result.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::controller::SessionController;
use super::form::{AuthField, AuthFormState, AuthMode, Submission};
use super::guard::AuthIntent;
use crate::config::UiTimings;

pub const SIGNED_UP_MESSAGE: &str = "Account created successfully!";
pub const SIGNED_IN_MESSAGE: &str = "Welcome back!";
pub const RESET_SENT_MESSAGE: &str = "Password reset link sent to your email!";
pub const CONFIRM_EMAIL_MESSAGE: &str =
    "Account created! Check your email to confirm it, then sign in.";

/// Result of one submit press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A submission is already in flight; nothing was sent.
    Busy,
    /// Rejected locally or by the backend; the message is shown inline.
    Rejected(String),
    /// Signed in or up. The modal closes after a short delay.
    Authenticated {
        message: String,
        return_to: Option<String>,
    },
    /// Reset link dispatched. The modal returns to sign-in after a delay.
    ResetLinkSent(String),
    /// Account created but not yet usable; the modal stays open on the message.
    ConfirmationPending(String),
}

struct ModalInner {
    open: bool,
    form: AuthFormState,
    /// Survives `close`, unlike the form's submission state.
    in_flight: bool,
    /// Bumped on close so stale timers and late results do nothing.
    generation: u64,
}

/// One auth modal instance.
pub struct AuthModal {
    controller: Arc<SessionController>,
    intent: AuthIntent,
    timings: UiTimings,
    inner: Arc<Mutex<ModalInner>>,
}

impl AuthModal {
    /// Create a closed modal whose initial mode and return target come from `intent`.
    pub fn new(controller: Arc<SessionController>, intent: AuthIntent, timings: UiTimings) -> Self {
        let form = intent.initial_form();
        Self {
            controller,
            intent,
            timings,
            inner: Arc::new(Mutex::new(ModalInner {
                open: false,
                form,
                in_flight: false,
                generation: 0,
            })),
        }
    }

    pub async fn open(&self) {
        self.inner.lock().await.open = true;
    }

    /// Close and reset to the initial mode with empty fields and no messages.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        close_locked(&mut inner, self.intent.mode);
    }

    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.open
    }

    pub async fn mode(&self) -> AuthMode {
        self.inner.lock().await.form.mode
    }

    pub async fn submission(&self) -> Submission {
        self.inner.lock().await.form.submission.clone()
    }

    pub async fn switch_mode(&self, target: AuthMode) -> bool {
        self.inner.lock().await.form.switch_mode(target)
    }

    pub async fn set_field(&self, field: AuthField, value: impl Into<String>) {
        self.inner.lock().await.form.set_field(field, value);
    }

    /// Validate and submit the form for the current mode.
    pub async fn submit(&self) -> SubmitOutcome {
        let (mode, name, email, password, generation) = {
            let mut inner = self.inner.lock().await;
            if inner.in_flight || inner.form.is_submitting() {
                debug!("Submit ignored; request already in flight");
                return SubmitOutcome::Busy;
            }
            if let Err(e) = inner.form.validate() {
                let message = e.to_string();
                inner.form.submission = Submission::Error(message.clone());
                return SubmitOutcome::Rejected(message);
            }
            inner.in_flight = true;
            inner.form.submission = Submission::Submitting;
            let f = &inner.form.fields;
            (
                inner.form.mode,
                f.name.clone(),
                f.email.clone(),
                f.password.expose_secret().to_string(),
                inner.generation,
            )
        };

        let result = match mode {
            AuthMode::Forgot => self
                .controller
                .reset_password(&email)
                .await
                .map(|()| SubmitOutcome::ResetLinkSent(RESET_SENT_MESSAGE.into())),
            AuthMode::SignUp => self
                .controller
                .sign_up(&email, &password, &name)
                .await
                .map(|session| {
                    if session.is_authenticated() {
                        self.authenticated(SIGNED_UP_MESSAGE)
                    } else {
                        SubmitOutcome::ConfirmationPending(CONFIRM_EMAIL_MESSAGE.into())
                    }
                }),
            AuthMode::SignIn => self
                .controller
                .sign_in(&email, &password)
                .await
                .map(|_| self.authenticated(SIGNED_IN_MESSAGE)),
        };
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => SubmitOutcome::Rejected(e.user_message()),
        };

        let mut inner = self.inner.lock().await;
        inner.in_flight = false;
        if inner.generation != generation {
            debug!(mode = %mode, "Modal closed during submit; result not shown");
            return outcome;
        }
        inner.form.submission = match &outcome {
            SubmitOutcome::Rejected(message) => Submission::Error(message.clone()),
            SubmitOutcome::Authenticated { message, .. }
            | SubmitOutcome::ResetLinkSent(message)
            | SubmitOutcome::ConfirmationPending(message) => Submission::Success(message.clone()),
            SubmitOutcome::Busy => Submission::Idle,
        };
        drop(inner);

        match &outcome {
            SubmitOutcome::ResetLinkSent(_) => self.schedule_return_to_sign_in(generation),
            SubmitOutcome::Authenticated { .. } => {
                info!(mode = %mode, "Auth modal submission succeeded");
                self.schedule_close(generation);
            }
            SubmitOutcome::ConfirmationPending(_) => {
                info!("Sign-up awaiting email confirmation");
            }
            SubmitOutcome::Rejected(_) | SubmitOutcome::Busy => {}
        }
        outcome
    }

    fn authenticated(&self, message: &str) -> SubmitOutcome {
        SubmitOutcome::Authenticated {
            message: message.to_string(),
            return_to: self.intent.return_to.clone(),
        }
    }

    fn schedule_return_to_sign_in(&self, generation: u64) {
        let inner = Arc::clone(&self.inner);
        let delay = self.timings.reset_return_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = inner.lock().await;
            if inner.generation == generation && inner.form.mode == AuthMode::Forgot {
                inner.form.mode = AuthMode::SignIn;
                inner.form.submission = Submission::Idle;
            }
        });
    }

    fn schedule_close(&self, generation: u64) {
        let inner = Arc::clone(&self.inner);
        let delay = self.timings.success_close_delay;
        let initial = self.intent.mode;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = inner.lock().await;
            if inner.generation == generation {
                close_locked(&mut inner, initial);
            }
        });
    }
}

fn close_locked(inner: &mut ModalInner, initial: AuthMode) {
    inner.open = false;
    inner.form.reset(initial);
    inner.generation += 1;
}
