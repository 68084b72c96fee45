//! Hosted backend over HTTP: the identity REST API (`/auth/v1`) and the
//! table REST API (`/rest/v1`).
//!
//! Every request carries the public API key. An empty URL or key yields
//! the permanent `Unconfigured` error without touching the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::traits::{BackendSession, IdentityBackend, LeadStore, SessionChange};
use crate::auth::session::SessionUser;
use crate::config::BackendConfig;
use crate::error::{IdentityError, StoreError};
use crate::leads::model::Inquiry;

const EVENT_CAPACITY: usize = 64;

/// Table the contact form inserts into.
pub const INQUIRIES_TABLE: &str = "client_inquiries";

/// Sessions are refreshed once they are this close to expiry.
const REFRESH_MARGIN_SECS: i64 = 60;

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserPayload,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl UserPayload {
    fn into_user(self) -> SessionUser {
        let display_name = self
            .user_metadata
            .get("full_name")
            .and_then(|v| v.as_str())
            .map(String::from);
        SessionUser {
            id: self.id,
            email: self.email.unwrap_or_default(),
            display_name,
        }
    }
}

impl TokenResponse {
    fn into_session(self) -> BackendSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .or_else(|| {
                self.expires_in
                    .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
            });
        BackendSession {
            user: self.user.into_user(),
            access_token: SecretString::from(self.access_token),
            refresh_token: self.refresh_token.map(SecretString::from),
            expires_at,
        }
    }
}

/// Error body shapes returned by the identity API (old and new style).
#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Map an identity API error body to a classified failure.
///
/// Structured error codes are preferred; message matching is the fallback for
/// deployments that only return a text message.
pub(crate) fn classify_auth_error(body: &str) -> IdentityError {
    let parsed: AuthErrorBody = serde_json::from_str(body).unwrap_or_default();

    match parsed.error_code.as_deref() {
        Some("user_already_exists") | Some("email_exists") => {
            return IdentityError::AlreadyRegistered;
        }
        Some("invalid_credentials") => return IdentityError::InvalidCredentials,
        _ => {}
    }

    let message = parsed
        .msg
        .or(parsed.error_description)
        .or(parsed.message)
        .or(parsed.error)
        .unwrap_or_default();

    if message.contains("already registered") {
        IdentityError::AlreadyRegistered
    } else if message.contains("Invalid login") {
        IdentityError::InvalidCredentials
    } else {
        IdentityError::Rejected { message }
    }
}

fn transport(e: reqwest::Error) -> IdentityError {
    IdentityError::Transport(e.to_string())
}

/// Return the response if successful, otherwise its classified error.
async fn check(resp: Response) -> Result<Response, IdentityError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    debug!(%status, body = %body, "Identity API returned an error");
    Err(classify_auth_error(&body))
}

// ── Identity ────────────────────────────────────────────────────────────

/// Identity backend speaking the hosted `/auth/v1` API.
pub struct SupabaseIdentity {
    http: reqwest::Client,
    config: BackendConfig,
    current: RwLock<Option<BackendSession>>,
    /// Bumped under the `current` write lock whenever the session is
    /// replaced or ended. A refresh commits only if it is unchanged.
    epoch: AtomicU64,
    events: broadcast::Sender<SessionChange>,
}

impl SupabaseIdentity {
    pub fn new(config: BackendConfig) -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self {
            http: reqwest::Client::new(),
            config,
            current: RwLock::new(None),
            epoch: AtomicU64::new(0),
            events,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.config.url)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, IdentityError> {
        if !self.config.is_configured() {
            return Err(IdentityError::Unconfigured);
        }
        Ok(self
            .http
            .request(method, self.url(path))
            .header("apikey", self.config.anon_key.expose_secret()))
    }

    async fn store_session(&self, session: BackendSession, change: SessionChange) {
        let mut current = self.current.write().await;
        *current = Some(session);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        drop(current);
        let _ = self.events.send(change);
    }

    /// Exchange the refresh token for a new session.
    ///
    /// If the session was ended or replaced while the request was out, the
    /// refreshed tokens are dropped.
    pub async fn refresh(&self) -> Result<(), IdentityError> {
        let (epoch, refresh_token) = {
            let current = self.current.read().await;
            let token = current
                .as_ref()
                .and_then(|s| s.refresh_token.as_ref())
                .map(|t| t.expose_secret().to_string());
            (self.epoch.load(Ordering::SeqCst), token)
        };
        let Some(refresh_token) = refresh_token else {
            return Ok(());
        };

        let resp = self
            .request(Method::POST, "token?grant_type=refresh_token")?
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(transport)?;
        let token: TokenResponse = check(resp).await?.json().await.map_err(transport)?;
        if self.commit_refresh(epoch, token.into_session()).await {
            debug!("Session token refreshed");
        } else {
            debug!("Session changed during refresh; refreshed tokens dropped");
        }
        Ok(())
    }

    /// Install a refreshed session taken at `epoch`, unless the session has
    /// moved on since. Returns whether it was installed.
    async fn commit_refresh(&self, epoch: u64, session: BackendSession) -> bool {
        let mut current = self.current.write().await;
        if current.is_none() || self.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        let user = session.user.clone();
        *current = Some(session);
        drop(current);
        let _ = self.events.send(SessionChange::TokenRefreshed(user));
        true
    }

    /// Drop the local session taken at `epoch` and tell subscribers it ended.
    async fn expire_local(&self, epoch: u64) {
        let mut current = self.current.write().await;
        if self.epoch.load(Ordering::SeqCst) != epoch || current.take().is_none() {
            return;
        }
        self.epoch.fetch_add(1, Ordering::SeqCst);
        drop(current);
        let _ = self.events.send(SessionChange::SignedOut);
    }
}

#[async_trait]
impl IdentityBackend for SupabaseIdentity {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Option<BackendSession>, IdentityError> {
        let resp = self
            .request(Method::POST, "signup")?
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "full_name": display_name },
            }))
            .send()
            .await
            .map_err(transport)?;
        let body: serde_json::Value = check(resp).await?.json().await.map_err(transport)?;

        // Projects that require email confirmation return the user without a session.
        if body.get("access_token").is_none() {
            info!(email = %email, "Account created; awaiting email confirmation");
            return Ok(None);
        }

        let token: TokenResponse = serde_json::from_value(body).map_err(|e| {
            IdentityError::Transport(format!("Unexpected sign-up response: {e}"))
        })?;
        let session = token.into_session();
        let user = session.user.clone();
        self.store_session(session.clone(), SessionChange::SignedIn(user))
            .await;
        info!(email = %email, "Account created");
        Ok(Some(session))
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<BackendSession, IdentityError> {
        let resp = self
            .request(Method::POST, "token?grant_type=password")?
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport)?;
        let token: TokenResponse = check(resp).await?.json().await.map_err(transport)?;
        let session = token.into_session();
        let user = session.user.clone();
        self.store_session(session.clone(), SessionChange::SignedIn(user))
            .await;
        Ok(session)
    }

    async fn invalidate_session(&self) -> Result<(), IdentityError> {
        let session = {
            let mut current = self.current.write().await;
            let Some(session) = current.take() else {
                return Ok(());
            };
            self.epoch.fetch_add(1, Ordering::SeqCst);
            session
        };
        let _ = self.events.send(SessionChange::SignedOut);

        let resp = self
            .request(Method::POST, "logout")?
            .bearer_auth(session.access_token.expose_secret())
            .send()
            .await
            .map_err(transport)?;
        check(resp).await?;
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let resp = self
            .request(Method::POST, "recover")?
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .map_err(transport)?;
        check(resp).await?;
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<BackendSession>, IdentityError> {
        if !self.config.is_configured() {
            return Err(IdentityError::Unconfigured);
        }
        Ok(self.current.read().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.events.subscribe()
    }
}

/// Spawn a background task that refreshes the session before it expires.
///
/// A failed refresh ends the session and publishes `SignedOut`.
pub fn spawn_refresh_task(
    identity: Arc<SupabaseIdentity>,
    check_every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(check_every);
        loop {
            interval.tick().await;
            let (epoch, due) = {
                let current = identity.current.read().await;
                let due = current.as_ref().is_some_and(|s| {
                    s.expires_within(Utc::now(), chrono::Duration::seconds(REFRESH_MARGIN_SECS))
                });
                (identity.epoch.load(Ordering::SeqCst), due)
            };
            if !due {
                continue;
            }
            if let Err(e) = identity.refresh().await {
                warn!(error = %e, "Session refresh failed, signing out");
                identity.expire_local(epoch).await;
            }
        }
    })
}

// ── Lead store ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct RestErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Lead store inserting into the `client_inquiries` table.
pub struct SupabaseLeadStore {
    http: reqwest::Client,
    config: BackendConfig,
}

impl SupabaseLeadStore {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl LeadStore for SupabaseLeadStore {
    async fn insert_inquiry(&self, inquiry: &Inquiry) -> Result<Option<Uuid>, StoreError> {
        if !self.config.is_configured() {
            return Err(StoreError::Unconfigured);
        }
        let key = self.config.anon_key.expose_secret();

        // Anonymous visitors may insert but not read back, so ask for no body.
        let resp = self
            .http
            .post(format!("{}/rest/v1/{INQUIRIES_TABLE}", self.config.url))
            .header("apikey", key)
            .bearer_auth(key)
            .header("Prefer", "return=minimal")
            .json(&[inquiry])
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if resp.status().is_success() {
            debug!(email = %inquiry.email, "Inquiry stored");
            return Ok(None);
        }

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let parsed: RestErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let message = parsed.message.unwrap_or_else(|| format!("HTTP {status}"));
        warn!(%status, message = %message, "Inquiry insert rejected");
        Err(StoreError::Rejected(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_structured_codes() {
        let body = r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#;
        assert_eq!(classify_auth_error(body), IdentityError::AlreadyRegistered);

        let body = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
        assert_eq!(classify_auth_error(body), IdentityError::InvalidCredentials);
    }

    #[test]
    fn falls_back_to_message_matching() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(classify_auth_error(body), IdentityError::InvalidCredentials);

        let body = r#"{"msg":"User already registered"}"#;
        assert_eq!(classify_auth_error(body), IdentityError::AlreadyRegistered);
    }

    #[test]
    fn other_errors_pass_message_through() {
        let body = r#"{"error_code":"over_email_send_rate_limit","msg":"Email rate limit exceeded"}"#;
        assert_eq!(
            classify_auth_error(body),
            IdentityError::Rejected {
                message: "Email rate limit exceeded".into()
            }
        );
        assert_eq!(
            classify_auth_error("<html>bad gateway</html>"),
            IdentityError::Rejected {
                message: String::new()
            }
        );
    }

    #[test]
    fn token_response_maps_metadata_name() {
        let json = r#"{
            "access_token": "at",
            "refresh_token": "rt",
            "expires_at": 1900000000,
            "user": {"id": "u1", "email": "ada@example.com", "user_metadata": {"full_name": "Ada"}}
        }"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        let session = token.into_session();
        assert_eq!(session.user.display_name.as_deref(), Some("Ada"));
        assert_eq!(session.user.email, "ada@example.com");
        assert_eq!(session.expires_at.unwrap().timestamp(), 1_900_000_000);
        assert!(session.refresh_token.is_some());
    }

    #[tokio::test]
    async fn unconfigured_backend_fails_without_network() {
        let identity = SupabaseIdentity::new(BackendConfig::new("", ""));
        assert_eq!(
            identity.authenticate("a@b.com", "longenough1").await.unwrap_err(),
            IdentityError::Unconfigured
        );
        assert_eq!(
            identity.current_session().await.unwrap_err(),
            IdentityError::Unconfigured
        );

        let store = SupabaseLeadStore::new(BackendConfig::new("https://x.supabase.co", ""));
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
        assert_eq!(
            store.insert_inquiry(&inquiry).await.unwrap_err(),
            StoreError::Unconfigured
        );
    }

    #[tokio::test]
    async fn sign_out_without_session_is_local_noop() {
        let identity = SupabaseIdentity::new(BackendConfig::new("", ""));
        assert!(identity.invalidate_session().await.is_ok());
    }

    fn session(email: &str) -> BackendSession {
        BackendSession {
            user: SessionUser {
                id: "u1".into(),
                email: email.into(),
                display_name: None,
            },
            access_token: SecretString::from("at".to_string()),
            refresh_token: Some(SecretString::from("rt".to_string())),
            expires_at: None,
        }
    }

    async fn signed_in(identity: &SupabaseIdentity, email: &str) {
        let session = session(email);
        let user = session.user.clone();
        identity
            .store_session(session, SessionChange::SignedIn(user))
            .await;
    }

    #[tokio::test]
    async fn refresh_after_sign_out_is_dropped() {
        let identity = SupabaseIdentity::new(BackendConfig::new("", ""));
        signed_in(&identity, "ada@example.com").await;
        let mut rx = identity.subscribe();
        let epoch = identity.epoch.load(Ordering::SeqCst);

        // Sign-out lands while the refresh request is still out.
        let _ = identity.invalidate_session().await;
        assert!(!identity.commit_refresh(epoch, session("ada@example.com")).await);

        assert!(identity.current.read().await.is_none());
        assert!(matches!(rx.try_recv(), Ok(SessionChange::SignedOut)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn refresh_after_new_sign_in_is_dropped() {
        let identity = SupabaseIdentity::new(BackendConfig::new("", ""));
        signed_in(&identity, "ada@example.com").await;
        let epoch = identity.epoch.load(Ordering::SeqCst);
        signed_in(&identity, "grace@example.com").await;

        assert!(!identity.commit_refresh(epoch, session("ada@example.com")).await);
        let current = identity.current.read().await;
        assert_eq!(current.as_ref().unwrap().user.email, "grace@example.com");
    }

    #[tokio::test]
    async fn refresh_commits_when_session_unchanged() {
        let identity = SupabaseIdentity::new(BackendConfig::new("", ""));
        signed_in(&identity, "ada@example.com").await;
        let mut rx = identity.subscribe();
        let epoch = identity.epoch.load(Ordering::SeqCst);

        assert!(identity.commit_refresh(epoch, session("ada@example.com")).await);
        assert!(matches!(rx.try_recv(), Ok(SessionChange::TokenRefreshed(_))));

        // A failed refresh from before a sign-out cannot end a later session.
        identity.expire_local(epoch + 1).await;
        assert!(identity.current.read().await.is_some());
        identity.expire_local(epoch).await;
        assert!(identity.current.read().await.is_none());
        assert!(matches!(rx.try_recv(), Ok(SessionChange::SignedOut)));
    }
}
