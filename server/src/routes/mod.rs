pub mod dcf;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}

/// Builds the CORS layer; an empty origin list allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}

pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/dcf/start", post(dcf::start_analysis))
        .route("/api/dcf/status/:job_id", get(dcf::job_status))
        .route("/api/dcf/cancel/:job_id", post(dcf::cancel_job))
        .route("/api/dcf/download/:job_id", get(dcf::download_archive))
        .route("/api/dcf/jobs", get(dcf::list_jobs))
        .route("/api/dcf/stats", get(dcf::job_stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}
