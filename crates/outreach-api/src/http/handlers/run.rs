//! Run handlers for the REST API.
//!
//! Endpoints for starting runs, resuming suspended runs with an approval
//! decision, and inspecting run status.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outreach_core::pipeline::engine::{RunOutcome, RunRequest};
use outreach_core::repository::RunRepository;
use outreach_types::run::RunRecord;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body for POST /api/v1/runs.
#[derive(Debug, Deserialize)]
pub struct StartRunBody {
    /// The initiating message; a job posting URL works directly.
    pub message: String,
    /// Explicit posting URL.
    #[serde(default)]
    pub source_url: Option<String>,
    /// Content brief; the configured default applies when omitted.
    #[serde(default)]
    pub brief: Option<String>,
}

/// Body for POST /api/v1/runs/:id/resume.
#[derive(Debug, Deserialize)]
pub struct ResumeBody {
    /// Decision token; only "yes" (any case) approves.
    pub decision: String,
}

/// Query parameters for listing runs.
#[derive(Debug, Deserialize)]
pub struct ListRunsQuery {
    /// Maximum number of runs to return (default 20).
    #[serde(default = "default_run_limit")]
    pub limit: u32,
    /// Only runs awaiting approval.
    #[serde(default)]
    pub suspended: bool,
}

fn default_run_limit() -> u32 {
    20
}

/// Serialized view of a run record.
#[derive(Debug, Serialize)]
pub struct RunView {
    pub run_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disposition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub state: serde_json::Value,
}

impl RunView {
    fn from_record(run: &RunRecord) -> Self {
        Self {
            run_id: run.id.to_string(),
            status: run.status.to_string(),
            stage: run.stage.map(|s| s.to_string()),
            disposition: run.disposition.map(|d| d.to_string()),
            prompt: run.prompt.clone(),
            error: run.error.clone(),
            started_at: run.started_at.to_rfc3339(),
            completed_at: run.completed_at.map(|t| t.to_rfc3339()),
            state: run.state.clone(),
        }
    }
}

/// What a start or resume call produced, as JSON.
fn outcome_json(outcome: &RunOutcome) -> serde_json::Value {
    match outcome {
        RunOutcome::Suspended { run_id, payload } => serde_json::json!({
            "run_id": run_id.to_string(),
            "status": "suspended",
            "prompt": payload.prompt,
            "draft": payload.draft,
        }),
        RunOutcome::Completed {
            run_id,
            disposition,
            state,
        } => serde_json::json!({
            "run_id": run_id.to_string(),
            "status": "completed",
            "disposition": disposition.to_string(),
            "conversation": state.conversation,
        }),
    }
}

fn outcome_run_id(outcome: &RunOutcome) -> Uuid {
    match outcome {
        RunOutcome::Suspended { run_id, .. } | RunOutcome::Completed { run_id, .. } => *run_id,
    }
}

/// Parse a run id from the path, mapping failures into the envelope error
/// body instead of axum's plain-text extractor rejection.
fn parse_run_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid run ID: '{raw}'")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/runs - Start a new run.
///
/// Drives the pipeline until it suspends at the approval gate (the common
/// case), completes, or fails.
pub async fn start_run(
    State(state): State<AppState>,
    Json(body): Json<StartRunBody>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if body.message.trim().is_empty() {
        return Err(AppError::Validation("'message' must not be empty".to_string()));
    }

    let request = RunRequest {
        message: body.message,
        source_url: body.source_url,
        brief: body.brief.unwrap_or_else(|| state.default_brief.clone()),
    };

    let outcome = state.engine.start(request).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let run_id = outcome_run_id(&outcome);
    let resp = ApiResponse::success(outcome_json(&outcome), request_id, elapsed)
        .with_link("self", &format!("/api/v1/runs/{run_id}"))
        .with_link("resume", &format!("/api/v1/runs/{run_id}/resume"));

    Ok(Json(resp))
}

/// POST /api/v1/runs/:id/resume - Resume a suspended run with a decision.
pub async fn resume_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Json(body): Json<ResumeBody>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let run_id = parse_run_id(&run_id)?;
    let outcome = state.engine.resume(run_id, &body.decision).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(outcome_json(&outcome), request_id, elapsed)
        .with_link("self", &format!("/api/v1/runs/{run_id}"));

    Ok(Json(resp))
}

/// GET /api/v1/runs/:id - Get a run with its full state checkpoint.
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<ApiResponse<RunView>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let run_id = parse_run_id(&run_id)?;
    let run = state
        .engine
        .checkpoint()
        .repo()
        .get_run(&run_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Run '{run_id}' not found")))?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(RunView::from_record(&run), request_id, elapsed)
        .with_link("self", &format!("/api/v1/runs/{run_id}"));

    Ok(Json(resp))
}

/// GET /api/v1/runs - List recent runs.
pub async fn list_runs(
    State(state): State<AppState>,
    Query(query): Query<ListRunsQuery>,
) -> Result<Json<ApiResponse<Vec<RunView>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let repo = state.engine.checkpoint().repo();
    let runs = if query.suspended {
        repo.list_suspended()
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
    } else {
        repo.list_runs(query.limit)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
    };

    let elapsed = start.elapsed().as_millis() as u64;
    let views: Vec<RunView> = runs.iter().map(RunView::from_record).collect();
    let resp = ApiResponse::success(views, request_id, elapsed)
        .with_link("self", "/api/v1/runs");

    Ok(Json(resp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_run_id_maps_to_validation_error() {
        let err = parse_run_id("not-a-uuid").unwrap_err();
        let AppError::Validation(msg) = err else {
            panic!("expected validation error");
        };
        assert!(msg.contains("not-a-uuid"));

        let id = Uuid::now_v7();
        assert_eq!(parse_run_id(&id.to_string()).unwrap(), id);
    }
}
