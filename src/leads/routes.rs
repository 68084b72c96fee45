//! REST endpoint for contact-form submissions.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info, warn};

use super::form::{CONTACT_FAILURE, CONTACT_SUCCESS, ContactFields};
use crate::backend::LeadStore;
use crate::error::StoreError;

/// Shared state for lead routes.
#[derive(Clone)]
pub struct LeadRouteState {
    pub store: Arc<dyn LeadStore>,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// POST /api/inquiries
async fn submit_inquiry(
    State(state): State<LeadRouteState>,
    Json(fields): Json<ContactFields>,
) -> Response {
    let inquiry = match fields.to_inquiry() {
        Ok(inquiry) => inquiry,
        Err(e) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()),
    };

    match state.store.insert_inquiry(&inquiry).await {
        Ok(id) => {
            info!(inquiry_id = ?id, "Inquiry accepted");
            (
                StatusCode::CREATED,
                Json(serde_json::json!({ "id": id, "message": CONTACT_SUCCESS })),
            )
                .into_response()
        }
        Err(e) if e.is_permanent() => {
            error!(error = %e, "Lead store unusable");
            error_response(StatusCode::SERVICE_UNAVAILABLE, CONTACT_FAILURE)
        }
        Err(e) => {
            warn!(error = %e, "Inquiry insert failed");
            let status = match e {
                StoreError::Rejected(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            };
            error_response(status, CONTACT_FAILURE)
        }
    }
}

/// Build the lead routes.
pub fn lead_routes(state: LeadRouteState) -> Router {
    Router::new()
        .route("/api/inquiries", post(submit_inquiry))
        .with_state(state)
}
