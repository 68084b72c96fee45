//! REST endpoints for the agent wizard.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use uuid::Uuid;

use super::manager::{DraftUpdate, WizardAction, WizardManager};
use super::model::{AgentType, NAME_SUGGESTIONS, Personality, VoiceStyle, suggest_name};
use crate::error::WizardError;

/// Shared state for wizard routes.
#[derive(Clone)]
pub struct WizardRouteState {
    pub manager: Arc<WizardManager>,
}

fn not_found(err: WizardError) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}

/// POST /api/wizard
async fn create(State(state): State<WizardRouteState>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(state.manager.create().await))
}

/// GET /api/wizard/{id}
async fn get_wizard(State(state): State<WizardRouteState>, Path(id): Path<Uuid>) -> Response {
    match state.manager.get(id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => not_found(e),
    }
}

/// PATCH /api/wizard/{id}/draft
async fn update_draft(
    State(state): State<WizardRouteState>,
    Path(id): Path<Uuid>,
    Json(update): Json<DraftUpdate>,
) -> Response {
    match state.manager.update_draft(id, update).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => not_found(e),
    }
}

/// POST /api/wizard/{id}/{action}
async fn transition(
    State(state): State<WizardRouteState>,
    Path((id, action)): Path<(Uuid, WizardAction)>,
) -> Response {
    match state.manager.transition(id, action).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => not_found(e),
    }
}

/// DELETE /api/wizard/{id}
async fn discard(State(state): State<WizardRouteState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.manager.discard(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// GET /api/wizard/options
///
/// Option tables for steps 2 to 4, plus name ideas.
async fn options() -> Json<serde_json::Value> {
    let agent_types: Vec<_> = AgentType::ALL
        .iter()
        .map(|t| serde_json::json!({ "id": t, "info": t.info() }))
        .collect();
    let personalities: Vec<_> = Personality::ALL
        .iter()
        .map(|p| serde_json::json!({ "id": p, "info": p.info() }))
        .collect();
    let voice_styles: Vec<_> = VoiceStyle::ALL
        .iter()
        .map(|v| serde_json::json!({ "id": v, "info": v.info() }))
        .collect();
    Json(serde_json::json!({
        "agent_types": agent_types,
        "personalities": personalities,
        "voice_styles": voice_styles,
        "name_suggestions": NAME_SUGGESTIONS,
        "suggested_name": suggest_name(),
    }))
}

/// Build the wizard REST routes.
pub fn wizard_routes(state: WizardRouteState) -> Router {
    Router::new()
        .route("/api/wizard", post(create))
        .route("/api/wizard/options", get(options))
        .route("/api/wizard/{id}", get(get_wizard).delete(discard))
        .route("/api/wizard/{id}/draft", patch(update_draft))
        .route("/api/wizard/{id}/{action}", post(transition))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        wizard_routes(WizardRouteState {
            manager: WizardManager::new(Vec::new()),
        })
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn options_lists_all_choices() {
        let resp = app()
            .oneshot(request("GET", "/api/wizard/options", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["agent_types"].as_array().unwrap().len(), 4);
        assert_eq!(json["agent_types"][0]["id"], "customer-support");
        assert_eq!(json["personalities"][3]["info"]["emoji"], "🧘");
        assert_eq!(json["voice_styles"][2]["info"]["label"], "Witty & Playful");
        assert_eq!(json["name_suggestions"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn unknown_wizard_is_404() {
        let id = Uuid::new_v4();
        let resp = app()
            .oneshot(request("GET", &format!("/api/wizard/{id}"), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app()
            .oneshot(request("POST", &format!("/api/wizard/{id}/next"), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_patch_and_advance() {
        let router = app();
        let resp = router
            .clone()
            .oneshot(request("POST", "/api/wizard", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created = body_json(resp).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["current_step"], 1);

        let resp = router
            .clone()
            .oneshot(request(
                "PATCH",
                &format!("/api/wizard/{id}/draft"),
                Some(serde_json::json!({ "name": "Spark" })),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["can_proceed"], true);

        let resp = router
            .oneshot(request("POST", &format!("/api/wizard/{id}/next"), None))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["moved"], true);
        assert_eq!(json["wizard"]["current_step"], 2);
        assert_eq!(json["wizard"]["draft"]["name"], "Spark");
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let router = app();
        let resp = router
            .clone()
            .oneshot(request("POST", "/api/wizard", None))
            .await
            .unwrap();
        let id = body_json(resp).await["id"].as_str().unwrap().to_string();
        let resp = router
            .oneshot(request("POST", &format!("/api/wizard/{id}/jump"), None))
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn delete_then_gone() {
        let router = app();
        let resp = router
            .clone()
            .oneshot(request("POST", "/api/wizard", None))
            .await
            .unwrap();
        let id = body_json(resp).await["id"].as_str().unwrap().to_string();

        let resp = router
            .clone()
            .oneshot(request("DELETE", &format!("/api/wizard/{id}"), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = router
            .oneshot(request("DELETE", &format!("/api/wizard/{id}"), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
