//! Lead capture: the contact form and the inquiries it produces.

pub mod form;
pub mod model;
pub mod routes;

pub use form::{ContactField, ContactFields, ContactForm, ContactOutcome, SubmitStatus};
pub use model::{ContactMethod, Inquiry, InquiryStatus};
pub use routes::{LeadRouteState, lead_routes};
