//! ContactForm: collects an inquiry and hands it to the lead store.
//!
//! One submission in flight at a time. Success clears the fields and the
//! success notice fades back to idle on its own; failure keeps everything
//! the visitor typed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::model::{ContactMethod, Inquiry};
use crate::auth::validation::validate_email;
use crate::backend::LeadStore;
use crate::config::UiTimings;
use crate::error::ValidationError;

pub const CONTACT_FAILURE: &str =
    "Failed to submit your inquiry. Please try again or contact us directly.";
pub const CONTACT_SUCCESS: &str = "Thank you! We've received your inquiry and will reach out to you soon via your preferred contact method.";

/// Everything the visitor types into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub project_description: String,
    pub preferred_contact: ContactMethod,
    pub budget_range: String,
    pub timeline: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Name,
    Email,
    Phone,
    Company,
    ProjectDescription,
    BudgetRange,
    Timeline,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl ContactFields {
    /// Check required fields and build the insert payload.
    ///
    /// The payload never carries `id`, `status` or `created_at`.
    pub fn to_inquiry(&self) -> Result<Inquiry, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        validate_email(self.email.trim())?;
        if self.project_description.trim().is_empty() {
            return Err(ValidationError::MissingField("project description"));
        }
        Ok(Inquiry {
            id: None,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: optional(&self.phone),
            company: optional(&self.company),
            project_description: self.project_description.trim().to_string(),
            preferred_contact: self.preferred_contact,
            budget_range: optional(&self.budget_range),
            timeline: optional(&self.timeline),
            status: None,
            created_at: None,
        })
    }
}

/// Submission state shown under the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SubmitStatus {
    #[default]
    Idle,
    Submitting,
    Success,
    Error(String),
}

/// Result of one submit press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactOutcome {
    Busy,
    Invalid(String),
    Submitted,
    Failed(String),
}

struct FormInner {
    fields: ContactFields,
    status: SubmitStatus,
    generation: u64,
}

pub struct ContactForm {
    store: Arc<dyn LeadStore>,
    timings: UiTimings,
    inner: Arc<Mutex<FormInner>>,
}

impl ContactForm {
    pub fn new(store: Arc<dyn LeadStore>, timings: UiTimings) -> Self {
        Self {
            store,
            timings,
            inner: Arc::new(Mutex::new(FormInner {
                fields: ContactFields::default(),
                status: SubmitStatus::Idle,
                generation: 0,
            })),
        }
    }

    pub async fn fields(&self) -> ContactFields {
        self.inner.lock().await.fields.clone()
    }

    pub async fn status(&self) -> SubmitStatus {
        self.inner.lock().await.status.clone()
    }

    pub async fn set_field(&self, field: ContactField, value: impl Into<String>) {
        let value = value.into();
        let mut inner = self.inner.lock().await;
        let f = &mut inner.fields;
        match field {
            ContactField::Name => f.name = value,
            ContactField::Email => f.email = value,
            ContactField::Phone => f.phone = value,
            ContactField::Company => f.company = value,
            ContactField::ProjectDescription => f.project_description = value,
            ContactField::BudgetRange => f.budget_range = value,
            ContactField::Timeline => f.timeline = value,
        }
    }

    pub async fn set_preferred_contact(&self, method: ContactMethod) {
        self.inner.lock().await.fields.preferred_contact = method;
    }

    pub async fn submit(&self) -> ContactOutcome {
        let (inquiry, generation) = {
            let mut inner = self.inner.lock().await;
            if inner.status == SubmitStatus::Submitting {
                debug!("Contact submit ignored; request already in flight");
                return ContactOutcome::Busy;
            }
            let inquiry = match inner.fields.to_inquiry() {
                Ok(inquiry) => inquiry,
                Err(e) => {
                    let message = e.to_string();
                    inner.status = SubmitStatus::Error(message.clone());
                    return ContactOutcome::Invalid(message);
                }
            };
            inner.status = SubmitStatus::Submitting;
            inner.generation += 1;
            (inquiry, inner.generation)
        };

        let result = self.store.insert_inquiry(&inquiry).await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(id) => {
                info!(inquiry_id = ?id, preferred_contact = %inquiry.preferred_contact, "Inquiry submitted");
                inner.fields = ContactFields::default();
                inner.status = SubmitStatus::Success;
                drop(inner);
                self.schedule_status_reset(generation);
                ContactOutcome::Submitted
            }
            Err(e) => {
                warn!(error = %e, "Inquiry submission failed");
                inner.status = SubmitStatus::Error(CONTACT_FAILURE.to_string());
                ContactOutcome::Failed(CONTACT_FAILURE.to_string())
            }
        }
    }

    fn schedule_status_reset(&self, generation: u64) {
        let inner = Arc::clone(&self.inner);
        let delay = self.timings.contact_status_reset;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = inner.lock().await;
            if inner.generation == generation && inner.status == SubmitStatus::Success {
                inner.status = SubmitStatus::Idle;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::backend::InMemoryLeadStore;
    use crate::error::StoreError;

    async fn filled(store: Arc<InMemoryLeadStore>) -> Arc<ContactForm> {
        let form = Arc::new(ContactForm::new(store, UiTimings::default()));
        form.set_field(ContactField::Name, "Ada Lovelace").await;
        form.set_field(ContactField::Email, "ada@example.com").await;
        form.set_field(ContactField::ProjectDescription, "A support agent").await;
        form
    }

    #[test]
    fn blank_optionals_are_absent() {
        let fields = ContactFields {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: "  ".into(),
            company: "".into(),
            project_description: "Bot".into(),
            budget_range: "10k-25k".into(),
            ..Default::default()
        };
        let inquiry = fields.to_inquiry().unwrap();
        assert_eq!(inquiry.phone, None);
        assert_eq!(inquiry.company, None);
        assert_eq!(inquiry.budget_range.as_deref(), Some("10k-25k"));
        assert_eq!(inquiry.preferred_contact, ContactMethod::Email);
        assert!(inquiry.id.is_none() && inquiry.status.is_none() && inquiry.created_at.is_none());
    }

    #[test]
    fn required_fields_checked_in_order() {
        let mut fields = ContactFields::default();
        assert_eq!(fields.to_inquiry(), Err(ValidationError::MissingName));
        fields.name = "Ada".into();
        fields.email = "not-an-email".into();
        assert_eq!(fields.to_inquiry(), Err(ValidationError::InvalidEmail));
        fields.email = "ada@example.com".into();
        assert!(matches!(
            fields.to_inquiry(),
            Err(ValidationError::MissingField(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn success_clears_fields_then_fades() {
        let store = Arc::new(InMemoryLeadStore::new());
        let form = filled(store.clone()).await;
        form.set_preferred_contact(ContactMethod::Text).await;

        assert_eq!(form.submit().await, ContactOutcome::Submitted);
        assert_eq!(store.call_count(), 1);
        let received = store.received().await;
        assert_eq!(received[0].preferred_contact, ContactMethod::Text);
        assert_eq!(received[0].name, "Ada Lovelace");

        assert_eq!(form.fields().await, ContactFields::default());
        assert_eq!(form.status().await, SubmitStatus::Success);

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(form.status().await, SubmitStatus::Success);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(form.status().await, SubmitStatus::Idle);
    }

    #[tokio::test]
    async fn failure_keeps_fields() {
        let store = Arc::new(InMemoryLeadStore::new());
        store.fail_next(StoreError::Rejected("rls".into())).await;
        let form = filled(store.clone()).await;
        let before = form.fields().await;

        assert_eq!(form.submit().await, ContactOutcome::Failed(CONTACT_FAILURE.into()));
        assert_eq!(form.fields().await, before);
        assert_eq!(form.status().await, SubmitStatus::Error(CONTACT_FAILURE.into()));
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_store() {
        let store = Arc::new(InMemoryLeadStore::new());
        let form = filled(store.clone()).await;
        form.set_field(ContactField::Email, "nope").await;

        assert_eq!(
            form.submit().await,
            ContactOutcome::Invalid("Please enter a valid email address".into())
        );
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_while_in_flight_is_busy() {
        let store = Arc::new(InMemoryLeadStore::new());
        store.set_latency(Duration::from_secs(1)).await;
        let form = filled(store.clone()).await;

        let first = {
            let form = Arc::clone(&form);
            tokio::spawn(async move { form.submit().await })
        };
        tokio::task::yield_now().await;
        assert_eq!(form.status().await, SubmitStatus::Submitting);
        assert_eq!(form.submit().await, ContactOutcome::Busy);

        assert_eq!(first.await.unwrap(), ContactOutcome::Submitted);
        assert_eq!(store.call_count(), 1);
    }

    #[test]
    fn status_wire_shape() {
        let json = serde_json::to_value(SubmitStatus::Error("x".into())).unwrap();
        assert_eq!(json["state"], "error");
        assert_eq!(json["message"], "x");
        let json = serde_json::to_value(SubmitStatus::Idle).unwrap();
        assert_eq!(json["state"], "idle");
    }
}
