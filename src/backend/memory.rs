//! In-process backends for tests and local development.
//!
//! Both record how often they were called so callers can assert that
//! validation failures never reach the backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::debug;
use uuid::Uuid;

use super::traits::{BackendSession, IdentityBackend, LeadStore, SessionChange};
use crate::auth::session::SessionUser;
use crate::error::{IdentityError, StoreError};
use crate::leads::model::Inquiry;

const EVENT_CAPACITY: usize = 64;

struct Account {
    id: String,
    password: String,
    display_name: Option<String>,
}

/// Identity backend holding accounts in memory.
pub struct InMemoryIdentity {
    accounts: RwLock<HashMap<String, Account>>,
    current: RwLock<Option<BackendSession>>,
    events: broadcast::Sender<SessionChange>,
    next_error: Mutex<Option<IdentityError>>,
    latency: Mutex<Duration>,
    calls: AtomicUsize,
    reset_requests: Mutex<Vec<String>>,
    confirm_email: AtomicBool,
}

impl Default for InMemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self {
            accounts: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            events,
            next_error: Mutex::new(None),
            latency: Mutex::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
            reset_requests: Mutex::new(Vec::new()),
            confirm_email: AtomicBool::new(false),
        }
    }

    /// Register an account directly, bypassing `create_account`.
    pub async fn add_account(&self, email: &str, password: &str, display_name: Option<&str>) {
        self.accounts.write().await.insert(
            email.to_lowercase(),
            Account {
                id: Uuid::new_v4().to_string(),
                password: password.to_string(),
                display_name: display_name.map(String::from),
            },
        );
    }

    /// Make the next backend call fail with `err`.
    pub async fn fail_next(&self, err: IdentityError) {
        *self.next_error.lock().await = Some(err);
    }

    /// Delay every call by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.lock().await = latency;
    }

    /// When set, new accounts get no session until the email is confirmed.
    pub fn require_confirmation(&self, on: bool) {
        self.confirm_email.store(on, Ordering::SeqCst);
    }

    /// Number of trait calls made so far (excluding `subscribe`).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Emails a reset link was dispatched to.
    pub async fn reset_requests(&self) -> Vec<String> {
        self.reset_requests.lock().await.clone()
    }

    /// Simulate the backend expiring the session on its own.
    pub async fn expire_session(&self) {
        self.current.write().await.take();
        let _ = self.events.send(SessionChange::SignedOut);
    }

    /// Simulate a background token refresh for the current session.
    pub async fn refresh_session(&self) {
        let refreshed = {
            let mut current = self.current.write().await;
            match current.as_mut() {
                Some(session) => {
                    session.access_token = SecretString::from(Uuid::new_v4().to_string());
                    session.expires_at = Some(Utc::now() + chrono::Duration::hours(1));
                    Some(session.user.clone())
                }
                None => None,
            }
        };
        if let Some(user) = refreshed {
            let _ = self.events.send(SessionChange::TokenRefreshed(user));
        }
    }

    /// Common prologue: count the call, apply latency and injected failures.
    async fn enter(&self) -> Result<(), IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match self.next_error.lock().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn issue(&self, user: SessionUser) -> BackendSession {
        let session = BackendSession {
            user: user.clone(),
            access_token: SecretString::from(Uuid::new_v4().to_string()),
            refresh_token: Some(SecretString::from(Uuid::new_v4().to_string())),
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        };
        *self.current.write().await = Some(session.clone());
        let _ = self.events.send(SessionChange::SignedIn(user));
        session
    }
}

#[async_trait]
impl IdentityBackend for InMemoryIdentity {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Option<BackendSession>, IdentityError> {
        self.enter().await?;
        let key = email.to_lowercase();
        let user = {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&key) {
                return Err(IdentityError::AlreadyRegistered);
            }
            let account = Account {
                id: Uuid::new_v4().to_string(),
                password: password.to_string(),
                display_name: Some(display_name.to_string()),
            };
            let user = SessionUser {
                id: account.id.clone(),
                email: email.to_string(),
                display_name: account.display_name.clone(),
            };
            accounts.insert(key, account);
            user
        };
        debug!(email = %email, "In-memory account created");
        if self.confirm_email.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(self.issue(user).await))
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<BackendSession, IdentityError> {
        self.enter().await?;
        let user = {
            let accounts = self.accounts.read().await;
            match accounts.get(&email.to_lowercase()) {
                Some(account) if account.password == password => SessionUser {
                    id: account.id.clone(),
                    email: email.to_string(),
                    display_name: account.display_name.clone(),
                },
                _ => return Err(IdentityError::InvalidCredentials),
            }
        };
        Ok(self.issue(user).await)
    }

    async fn invalidate_session(&self) -> Result<(), IdentityError> {
        self.enter().await?;
        self.current.write().await.take();
        let _ = self.events.send(SessionChange::SignedOut);
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        self.enter().await?;
        // Unknown addresses succeed too, so the response does not reveal accounts.
        self.reset_requests.lock().await.push(email.to_string());
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<BackendSession>, IdentityError> {
        self.enter().await?;
        Ok(self.current.read().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.events.subscribe()
    }
}

/// Lead store keeping inserted inquiries in memory.
#[derive(Default)]
pub struct InMemoryLeadStore {
    rows: RwLock<Vec<Inquiry>>,
    next_error: Mutex<Option<StoreError>>,
    latency: Mutex<Duration>,
    calls: AtomicUsize,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next insert fail with `err`.
    pub async fn fail_next(&self, err: StoreError) {
        *self.next_error.lock().await = Some(err);
    }

    /// Delay every insert by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.lock().await = latency;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Inquiries exactly as they were handed to `insert_inquiry`.
    pub async fn received(&self) -> Vec<Inquiry> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn insert_inquiry(&self, inquiry: &Inquiry) -> Result<Option<Uuid>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if let Some(err) = self.next_error.lock().await.take() {
            return Err(err);
        }
        debug!(email = %inquiry.email, "Inquiry stored in memory");
        self.rows.write().await.push(inquiry.clone());
        Ok(Some(Uuid::new_v4()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_account_is_rejected() {
        let backend = InMemoryIdentity::new();
        backend
            .create_account("ada@example.com", "longenough1", "Ada")
            .await
            .unwrap();
        let err = backend
            .create_account("ADA@example.com", "longenough1", "Ada")
            .await
            .unwrap_err();
        assert_eq!(err, IdentityError::AlreadyRegistered);
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let backend = InMemoryIdentity::new();
        backend.add_account("ada@example.com", "longenough1", None).await;
        let err = backend
            .authenticate("ada@example.com", "wrongpassword")
            .await
            .unwrap_err();
        assert_eq!(err, IdentityError::InvalidCredentials);
        assert!(backend.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_in_then_out_publishes_events() {
        let backend = InMemoryIdentity::new();
        let mut rx = backend.subscribe();
        backend.add_account("ada@example.com", "longenough1", Some("Ada")).await;

        backend.authenticate("ada@example.com", "longenough1").await.unwrap();
        backend.invalidate_session().await.unwrap();

        match rx.recv().await.unwrap() {
            SessionChange::SignedIn(u) => assert_eq!(u.display_name.as_deref(), Some("Ada")),
            other => panic!("Expected SignedIn, got {other:?}"),
        }
        assert_eq!(rx.recv().await.unwrap(), SessionChange::SignedOut);
    }

    #[tokio::test]
    async fn injected_failure_is_one_shot() {
        let store = InMemoryLeadStore::new();
        store.fail_next(StoreError::Transport("down".into())).await;

        let inquiry = Inquiry {
            id: None,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: None,
            company: None,
            project_description: "Bot".into(),
            preferred_contact: Default::default(),
            budget_range: None,
            timeline: None,
            status: None,
            created_at: None,
        };
        assert!(store.insert_inquiry(&inquiry).await.is_err());
        assert!(store.insert_inquiry(&inquiry).await.is_ok());
        assert_eq!(store.call_count(), 2);
        assert_eq!(store.received().await.len(), 1);
    }
}
