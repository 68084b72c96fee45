//! Authentication: session ownership, the auth modal, and route guarding.
//!
//! One `SessionController` owns the `AuthSession`. Everything else reads it
//! through a `watch` receiver or a snapshot and never writes it.

pub mod controller;
pub mod form;
pub mod guard;
pub mod modal;
pub mod routes;
pub mod session;
pub mod validation;

pub use controller::SessionController;
pub use form::{AuthField, AuthFormState, AuthMode, Submission};
pub use guard::{AuthIntent, RouteDecision, guard};
pub use modal::{AuthModal, SubmitOutcome};
pub use routes::{AuthRouteState, auth_routes};
pub use session::{AuthSession, AuthStatus, SessionUser};
