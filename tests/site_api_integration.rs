//! Integration tests for the site HTTP + session WebSocket surface.
//!
//! Each test spins up an Axum server on a random port backed by in-memory
//! backends, then drives it with reqwest and tokio-tungstenite.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use agent_studio::auth::SessionController;
use agent_studio::backend::{InMemoryIdentity, InMemoryLeadStore};
use agent_studio::server::{SiteState, site_routes};
use agent_studio::wizard::WizardManager;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

struct TestSite {
    port: u16,
    identity: Arc<InMemoryIdentity>,
    leads: Arc<InMemoryLeadStore>,
    http: reqwest::Client,
}

impl TestSite {
    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }
}

/// Start an Axum server on a random port with one registered account.
async fn start_server() -> TestSite {
    let identity = Arc::new(InMemoryIdentity::new());
    identity
        .add_account("ada@example.com", "longenough1", Some("Ada Lovelace"))
        .await;
    let leads = Arc::new(InMemoryLeadStore::new());

    let controller = SessionController::new(identity.clone());
    controller.initialize().await;
    controller.spawn_change_listener();

    let app = site_routes(
        SiteState {
            controller,
            wizards: WizardManager::new(Vec::new()),
            leads: leads.clone(),
        },
        None,
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestSite {
        port,
        identity,
        leads,
        http: reqwest::Client::new(),
    }
}

/// Parse a WS text frame into a serde_json::Value.
fn parse_ws_json(msg: &Message) -> Value {
    match msg {
        Message::Text(txt) => serde_json::from_str(txt).expect("invalid JSON from server"),
        other => panic!("expected Text frame, got {:?}", other),
    }
}

// ── Session ──────────────────────────────────────────────────────────

#[tokio::test]
async fn ws_pushes_sign_in_and_sign_out() {
    timeout(TEST_TIMEOUT, async {
        let site = start_server().await;

        let (mut ws, _resp) = connect_async(format!("ws://127.0.0.1:{}/ws/session", site.port))
            .await
            .expect("WS connect failed");

        let first = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(first["status"], "unauthenticated");

        let resp = site
            .http
            .post(site.url("/api/auth/signin"))
            .json(&json!({"email": "ada@example.com", "password": "longenough1"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let signed_in = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(signed_in["status"], "authenticated");
        assert_eq!(signed_in["user"]["email"], "ada@example.com");

        let resp = site
            .http
            .post(site.url("/api/auth/signout"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        // The listener may echo backend events; skip until the sign-out lands.
        loop {
            let msg = parse_ws_json(&ws.next().await.unwrap().unwrap());
            if msg["status"] == "unauthenticated" {
                assert!(msg["user"].is_null());
                break;
            }
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn dashboard_requires_session() {
    timeout(TEST_TIMEOUT, async {
        let site = start_server().await;

        let resp = site.http.get(site.url("/api/dashboard")).send().await.unwrap();
        assert_eq!(resp.status(), 401);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["intent"]["return_to"], "/dashboard");

        site.http
            .post(site.url("/api/auth/signin"))
            .json(&json!({"email": "ada@example.com", "password": "longenough1"}))
            .send()
            .await
            .unwrap();

        let resp = site.http.get(site.url("/api/dashboard")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["menu_name"], "Ada Lovelace");
        assert_eq!(json["initials"], "AL");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn invalid_sign_in_never_reaches_backend() {
    timeout(TEST_TIMEOUT, async {
        let site = start_server().await;
        let before = site.identity.call_count();

        let resp = site
            .http
            .post(site.url("/api/auth/signin"))
            .json(&json!({"email": "not-an-email", "password": "longenough1"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 422);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["error"], "Please enter a valid email address");
        assert_eq!(site.identity.call_count(), before);
    })
    .await
    .expect("test timed out");
}

// ── Wizard ───────────────────────────────────────────────────────────

#[tokio::test]
async fn wizard_full_pass_hands_off_to_contact() {
    timeout(TEST_TIMEOUT, async {
        let site = start_server().await;

        let created: Value = site
            .http
            .post(site.url("/api/wizard"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let answers = [
            json!({"name": "Nova"}),
            json!({"agent_type": "personal-assistant"}),
            json!({"personality": "energetic"}),
            json!({"voice_style": "direct"}),
        ];
        for answer in answers {
            site.http
                .patch(site.url(&format!("/api/wizard/{id}/draft")))
                .json(&answer)
                .send()
                .await
                .unwrap();
            let outcome: Value = site
                .http
                .post(site.url(&format!("/api/wizard/{id}/next")))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(outcome["moved"], true);
        }

        let state: Value = site
            .http
            .get(site.url(&format!("/api/wizard/{id}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(state["current_step"], 5);
        assert_eq!(state["config"]["agent_type"], "personal-assistant");

        let deployed: Value = site
            .http
            .post(site.url(&format!("/api/wizard/{id}/deploy")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(deployed["navigate"]["to"], "/#contact");

        let restarted: Value = site
            .http
            .post(site.url(&format!("/api/wizard/{id}/restart")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(restarted["wizard"]["current_step"], 1);
        assert_eq!(restarted["wizard"]["draft"]["name"], "");
    })
    .await
    .expect("test timed out");
}

// ── Leads ────────────────────────────────────────────────────────────

#[tokio::test]
async fn inquiry_is_stored_once() {
    timeout(TEST_TIMEOUT, async {
        let site = start_server().await;

        let resp = site
            .http
            .post(site.url("/api/inquiries"))
            .json(&json!({
                "name": "Grace Hopper",
                "email": "grace@example.com",
                "project_description": "An onboarding guide for new hires",
                "preferred_contact": "text",
                "timeline": ""
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);

        assert_eq!(site.leads.call_count(), 1);
        let rows = site.leads.received().await;
        assert_eq!(rows[0].email, "grace@example.com");
        assert_eq!(rows[0].timeline, None);
        assert!(rows[0].status.is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn catalog_filters() {
    timeout(TEST_TIMEOUT, async {
        let site = start_server().await;
        let json: Value = site
            .http
            .get(site.url("/api/catalog?category=operations&q=code"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let agents = json["agents"].as_array().unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0]["name"], "Code Reviewer");
    })
    .await
    .expect("test timed out");
}
