//! HTTP server assembly: merges every route group behind one CORS layer.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{AuthRouteState, SessionController, auth_routes};
use crate::backend::LeadStore;
use crate::catalog::catalog_routes;
use crate::leads::{LeadRouteState, lead_routes};
use crate::wizard::{WizardManager, WizardRouteState, wizard_routes};

/// Everything the routes need.
#[derive(Clone)]
pub struct SiteState {
    pub controller: Arc<SessionController>,
    pub wizards: Arc<WizardManager>,
    pub leads: Arc<dyn LeadStore>,
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn cors(allowed_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);
    match allowed_origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

/// Build the full site router.
pub fn site_routes(state: SiteState, allowed_origin: Option<&str>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth_routes(AuthRouteState {
            controller: state.controller,
        }))
        .merge(wizard_routes(WizardRouteState {
            manager: state.wizards,
        }))
        .merge(lead_routes(LeadRouteState { store: state.leads }))
        .merge(catalog_routes())
        .layer(cors(allowed_origin))
}
