//! REST + WebSocket endpoints for the session, plus the protected dashboard.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::controller::SessionController;
use super::guard::{AuthIntent, IntentQuery, RouteDecision, guard};
use super::modal::RESET_SENT_MESSAGE;
use super::session::AuthSession;
use super::validation::validate_sign_up;
use crate::error::AuthError;

/// Shared state for auth routes.
#[derive(Clone)]
pub struct AuthRouteState {
    pub controller: Arc<SessionController>,
}

#[derive(Debug, Deserialize)]
struct SignUpRequest {
    name: String,
    email: String,
    password: String,
    confirm_password: String,
}

#[derive(Debug, Deserialize)]
struct SignInRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct ResetRequest {
    email: String,
}

/// Build the auth routes.
pub fn auth_routes(state: AuthRouteState) -> Router {
    Router::new()
        .route("/api/auth/session", get(get_session))
        .route("/api/auth/signup", post(sign_up))
        .route("/api/auth/signin", post(sign_in))
        .route("/api/auth/signout", post(sign_out))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/auth/intent", get(get_intent))
        .route("/api/dashboard", get(dashboard))
        .route("/ws/session", get(session_ws))
        .with_state(state)
}

fn error_response(err: AuthError) -> Response {
    let status = match err {
        AuthError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AuthError::AlreadyRegistered => StatusCode::CONFLICT,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Unconfigured => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::Backend(_) => StatusCode::BAD_REQUEST,
    };
    (status, Json(serde_json::json!({ "error": err.user_message() }))).into_response()
}

/// GET /api/auth/session
async fn get_session(State(state): State<AuthRouteState>) -> Json<AuthSession> {
    Json(state.controller.session())
}

/// POST /api/auth/signup
async fn sign_up(State(state): State<AuthRouteState>, Json(req): Json<SignUpRequest>) -> Response {
    if let Err(e) = validate_sign_up(&req.name, &req.email, &req.password, &req.confirm_password) {
        return error_response(e.into());
    }
    match state
        .controller
        .sign_up(&req.email, &req.password, &req.name)
        .await
    {
        Ok(session) => Json(session).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/auth/signin
async fn sign_in(State(state): State<AuthRouteState>, Json(req): Json<SignInRequest>) -> Response {
    match state.controller.sign_in(&req.email, &req.password).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/auth/signout
async fn sign_out(State(state): State<AuthRouteState>) -> Json<AuthSession> {
    state.controller.sign_out().await;
    Json(state.controller.session())
}

/// POST /api/auth/reset-password
async fn reset_password(
    State(state): State<AuthRouteState>,
    Json(req): Json<ResetRequest>,
) -> Response {
    match state.controller.reset_password(&req.email).await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "message": RESET_SENT_MESSAGE })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/auth/intent?auth=signin&redirect=/dashboard
///
/// Maps the navigation intent to the auth modal's initial mode, once.
async fn get_intent(Query(query): Query<IntentQuery>) -> Json<serde_json::Value> {
    let intent = AuthIntent::from_query(&query);
    let initial_mode = intent.as_ref().map(|i| i.initial_form().mode);
    Json(serde_json::json!({
        "intent": intent,
        "initial_mode": initial_mode,
    }))
}

/// GET /api/dashboard, the protected view.
async fn dashboard(State(state): State<AuthRouteState>) -> Response {
    let session = state.controller.session();
    match guard(&session, "/dashboard") {
        RouteDecision::Pending => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(RouteDecision::Pending),
        )
            .into_response(),
        RouteDecision::Render => match session.user {
            Some(user) => Json(serde_json::json!({
                "menu_name": user.menu_name(),
                "initials": user.initials(),
                "user": user,
            }))
            .into_response(),
            None => StatusCode::UNAUTHORIZED.into_response(),
        },
        redirect @ RouteDecision::Redirect { .. } => {
            (StatusCode::UNAUTHORIZED, Json(redirect)).into_response()
        }
    }
}

// ── WebSocket ───────────────────────────────────────────────────────────

async fn session_ws(ws: WebSocketUpgrade, State(state): State<AuthRouteState>) -> impl IntoResponse {
    let rx = state.controller.subscribe();
    ws.on_upgrade(move |socket| stream_session(socket, rx))
}

async fn send_session(socket: &mut WebSocket, session: &AuthSession) -> bool {
    match serde_json::to_string(session) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize session");
            true
        }
    }
}

/// Push the current session on connect, then every change.
async fn stream_session(mut socket: WebSocket, mut rx: watch::Receiver<AuthSession>) {
    info!("Session WebSocket client connected");

    let current = rx.borrow_and_update().clone();
    if !send_session(&mut socket, &current).await {
        return;
    }

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    debug!("Session channel closed");
                    break;
                }
                let session = rx.borrow_and_update().clone();
                if !send_session(&mut socket, &session).await {
                    debug!("Client disconnected during send");
                    break;
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(error = %e, "Session WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("Session WebSocket closed");
}
