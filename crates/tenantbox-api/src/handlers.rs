//! Request handlers.
//!
//! Coordinator operations block on the container runtime, so each one runs
//! on tokio's blocking pool. A client that disconnects mid-request does not
//! cancel the runtime call; the identity's lock is released as soon as that
//! call returns.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tenantbox_common::error::Result as LifecycleResult;
use tenantbox_common::types::{LifecycleState, UserIdentity};
use tenantbox_runtime::coordinator::{Coordinator, ExecOutcome};

use crate::api::AppState;
use crate::error::{ApiError, Result};

/// Body of the start and stop endpoints.
#[derive(Debug, Deserialize)]
pub struct IdentityRequest {
    /// User identity.
    pub identity: String,
}

/// Body of the exec endpoint.
#[derive(Debug, Deserialize)]
pub struct ExecRequest {
    /// User identity.
    pub identity: String,
    /// Command and arguments, one element per argument.
    pub argv: Vec<String>,
}

/// Response carrying a human-readable message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Summary of what happened.
    pub message: String,
}

/// Response of the status endpoint.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Observed lifecycle state.
    pub status: LifecycleState,
}

/// `POST /containers/start`
pub async fn start_container(
    State(state): State<AppState>,
    Json(req): Json<IdentityRequest>,
) -> Result<Json<MessageResponse>> {
    let identity = UserIdentity::parse(req.identity)?;
    tracing::info!(identity = %identity, "start requested");
    let outcome = blocking(&state, move |c| c.ensure_started(&identity)).await?;
    Ok(Json(MessageResponse {
        message: outcome.message().to_string(),
    }))
}

/// `POST /containers/stop`
pub async fn stop_container(
    State(state): State<AppState>,
    Json(req): Json<IdentityRequest>,
) -> Result<Json<MessageResponse>> {
    let identity = UserIdentity::parse(req.identity)?;
    tracing::info!(identity = %identity, "stop requested");
    let outcome = blocking(&state, move |c| c.stop_and_remove(&identity)).await?;
    Ok(Json(MessageResponse {
        message: outcome.message().to_string(),
    }))
}

/// `POST /containers/exec`
pub async fn exec_container(
    State(state): State<AppState>,
    Json(req): Json<ExecRequest>,
) -> Result<Json<ExecOutcome>> {
    let identity = UserIdentity::parse(req.identity)?;
    tracing::info!(identity = %identity, argc = req.argv.len(), "exec requested");
    let argv = req.argv;
    let outcome = blocking(&state, move |c| c.exec_in(&identity, &argv)).await?;
    Ok(Json(outcome))
}

/// `GET /containers/{identity}/status`
pub async fn container_status(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<StatusResponse>> {
    let identity = UserIdentity::parse(identity)?;
    let status = blocking(&state, move |c| c.get_status(&identity)).await?;
    Ok(Json(StatusResponse { status }))
}

/// Runs a coordinator operation on the blocking pool.
async fn blocking<T, F>(state: &AppState, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Coordinator) -> LifecycleResult<T> + Send + 'static,
{
    let coordinator = Arc::clone(&state.coordinator);
    tokio::task::spawn_blocking(move || op(&coordinator))
        .await
        .map_err(|e| ApiError::Aborted(e.to_string()))?
        .map_err(ApiError::from)
}
