//! Node HTTP surface (§4.3): claim the next eligible task, report status
//! for a previously claimed one.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use dispatch_core::{NodeRef, StatusUpdate};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// `POST /organizations/{org}/foodtruck/nodes/{name}/tasks/next`
pub async fn claim_next_task(
    State(state): State<Arc<AppState>>,
    Path((organization, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let node = NodeRef { organization, name };
    let task = state.scheduler.claim_next_task(&node).await?;
    Ok((StatusCode::OK, Json(task)))
}

/// `POST /organizations/{org}/foodtruck/nodes/{name}/tasks/status`
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path((organization, name)): Path<(String, String)>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let node = NodeRef { organization, name };
    state.scheduler.update_status(&node, update).await?;
    Ok(StatusCode::OK)
}
