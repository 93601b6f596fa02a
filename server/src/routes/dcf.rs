//! Valuation job endpoints under `/api/dcf`.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use dcfcrew::jobs::{JobSnapshot, JobStats, JobSummary};
use dcfcrew::StartRequest;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn start_analysis(
    State(state): State<AppState>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let job_id = state.control.start(request)?;
    Ok(Json(json!({ "job_id": job_id })))
}

pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobSnapshot>> {
    Ok(Json(state.control.status(&job_id)?))
}

pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobSnapshot>> {
    Ok(Json(state.control.cancel(&job_id)?))
}

pub async fn download_archive(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let artifact = state.control.download(&job_id)?;
    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(artifact.bytes.to_vec()),
    )
        .into_response())
}

pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobSummary>> {
    Json(state.control.list())
}

pub async fn job_stats(State(state): State<AppState>) -> Json<JobStats> {
    Json(state.control.stats())
}
