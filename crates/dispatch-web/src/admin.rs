//! Admin HTTP surface (§4.3): submit a job, fetch a job with aggregated
//! status.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use dispatch_core::{JobId, JobSubmission};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub id: JobId,
}

/// `POST /admin/jobs`
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    ApiJson(submission): ApiJson<JobSubmission>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.scheduler.submit_job(submission).await?;
    Ok((StatusCode::OK, Json(SubmitJobResponse { id })))
}

#[derive(Debug, Deserialize)]
pub struct GetJobQuery {
    #[serde(rename = "fetchStatuses", default)]
    pub fetch_statuses: bool,
}

/// `GET /admin/jobs/{job_id}?fetchStatuses={true|false}`
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    Query(query): Query<GetJobQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .scheduler
        .get_job(&job_id, query.fetch_statuses)
        .await?;
    Ok((StatusCode::OK, Json(result)))
}
