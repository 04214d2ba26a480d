//! Route handlers.
//!
//! Errors are reported as `{"detail": "<message>"}` with a 4xx status when the
//! request is at fault and 5xx otherwise.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use dataops_intent::IntentError;
use dataops_tasks::fsio::confine;
use dataops_tasks::{Operation, TaskError};

use crate::state::AppState;

/// Header carrying the per-request id on `/run` responses.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// An error response: status code plus the `detail` message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<IntentError> for ApiError {
    fn from(err: IntentError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, err.to_string())
    }
}

// ---------------------------------------------------------------------------
// POST /run
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RunParams {
    #[serde(default)]
    pub task: String,
}

/// Success payload for `/run`.
#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub status: &'static str,
    pub operation: Operation,
    pub output: PathBuf,
    pub skipped: usize,
    pub summary: String,
}

/// Classify and run a task.
pub async fn run(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RunParams>,
) -> Response {
    let request_id = Uuid::now_v7();
    let span = info_span!("run", request_id = %request_id);

    let result = async {
        info!(task = %params.task, "task received");
        let outcome = state.executor.execute(&params.task).await;
        if let Err(e) = &outcome {
            warn!(error = %e, "task failed");
        }
        outcome
    }
    .instrument(span)
    .await;

    let mut response = match result {
        Ok(outcome) => Json(RunResponse {
            status: "success",
            operation: outcome.operation,
            output: outcome.output_path,
            skipped: outcome.skipped,
            summary: outcome.summary,
        })
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    };

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

// ---------------------------------------------------------------------------
// GET /read
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReadParams {
    #[serde(default)]
    pub path: String,
}

/// Return the raw content of a file under the data root.
///
/// The path is validated lexically before any filesystem access.
pub async fn read(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReadParams>,
) -> Result<Response, ApiError> {
    let path = confine(&state.data_root, &params.path).map_err(|e| match e {
        TaskError::PathOutsideRoot { .. } => ApiError::new(StatusCode::BAD_REQUEST, e.to_string()),
        other => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    })?;

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            bytes,
        )
            .into_response()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("file not found: {}", path.display()),
        )),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "read failed");
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to read {}: {e}", path.display()),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Response payload for the `/api/status` endpoint.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub data_root: PathBuf,
    pub operation_count: usize,
    pub uptime_seconds: u64,
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        data_root: state.data_root.clone(),
        operation_count: state.executor.operations().len(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

// ---------------------------------------------------------------------------
// GET /api/operations
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct OperationInfo {
    pub key: Operation,
    pub example: &'static str,
}

/// Registered operations with one example task each.
pub async fn operations(State(state): State<Arc<AppState>>) -> Json<Vec<OperationInfo>> {
    Json(
        state
            .executor
            .operations()
            .into_iter()
            .map(|op| OperationInfo {
                key: op,
                example: op.example(),
            })
            .collect(),
    )
}
