//! Durable checkpoint manager for run state.
//!
//! Wraps `RunRepository` to provide a higher-level API for persisting run
//! transitions. The full serialized state goes out with every checkpoint, so
//! a suspended or crashed run can be reconstructed from a single record read
//! after a process restart.

use chrono::Utc;
use outreach_types::run::{Disposition, RunRecord, RunStatus, StageId};
use outreach_types::state::OutreachState;
use uuid::Uuid;

use crate::repository::RunRepository;

// ---------------------------------------------------------------------------
// CheckpointManager
// ---------------------------------------------------------------------------

/// Manages durable checkpoints for pipeline runs.
///
/// Generic over `R: RunRepository` so it works with any storage backend
/// (SQLite, in-memory mock, etc.). Every transition is persisted before the
/// engine moves forward.
pub struct CheckpointManager<R: RunRepository> {
    repo: R,
}

impl<R: RunRepository> CheckpointManager<R> {
    /// Create a new checkpoint manager backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Access the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Persist a freshly created run record.
    pub async fn create(&self, run: &RunRecord) -> Result<(), CheckpointError> {
        self.repo
            .create_run(run)
            .await
            .map_err(|e| CheckpointError::Repository(e.to_string()))?;

        tracing::debug!(run_id = %run.id, "checkpointed run created");
        Ok(())
    }

    /// Atomically claim a suspended run for resumption.
    ///
    /// Returns `false` when the run is missing or not suspended. The compare
    /// and swap lives in the repository, so at most one caller wins a resume
    /// race.
    pub async fn claim_suspended(&self, run_id: Uuid) -> Result<bool, CheckpointError> {
        let claimed = self
            .repo
            .claim_suspended(&run_id)
            .await
            .map_err(|e| CheckpointError::Repository(e.to_string()))?;

        if claimed {
            tracing::debug!(run_id = %run_id, "claimed suspended run");
        }
        Ok(claimed)
    }

    /// Checkpoint a completed stage: record the stage and the merged state.
    pub async fn checkpoint_stage(
        &self,
        run: &mut RunRecord,
        stage: StageId,
        state: &OutreachState,
    ) -> Result<(), CheckpointError> {
        run.stage = Some(stage);
        run.state = encode_state(state)?;
        self.save(run).await?;

        tracing::debug!(run_id = %run.id, stage = %stage, "checkpointed stage");
        Ok(())
    }

    /// Park the run awaiting a human decision.
    pub async fn checkpoint_suspended(
        &self,
        run: &mut RunRecord,
        stage: StageId,
        state: &OutreachState,
        prompt: &str,
    ) -> Result<(), CheckpointError> {
        run.status = RunStatus::Suspended;
        run.stage = Some(stage);
        run.state = encode_state(state)?;
        run.prompt = Some(prompt.to_string());
        self.save(run).await?;

        tracing::info!(run_id = %run.id, stage = %stage, "checkpointed run suspended");
        Ok(())
    }

    /// Record a terminal outcome.
    pub async fn checkpoint_completed(
        &self,
        run: &mut RunRecord,
        state: &OutreachState,
        disposition: Disposition,
    ) -> Result<(), CheckpointError> {
        run.status = RunStatus::Completed;
        run.state = encode_state(state)?;
        run.prompt = None;
        run.disposition = Some(disposition);
        run.completed_at = Some(Utc::now());
        self.save(run).await?;

        tracing::info!(
            run_id = %run.id,
            disposition = %disposition,
            "checkpointed run completed"
        );
        Ok(())
    }

    /// Record an unrecoverable stage failure.
    pub async fn checkpoint_failed(
        &self,
        run: &mut RunRecord,
        state: &OutreachState,
        error: &str,
    ) -> Result<(), CheckpointError> {
        run.status = RunStatus::Failed;
        run.state = encode_state(state)?;
        run.prompt = None;
        run.error = Some(error.to_string());
        run.completed_at = Some(Utc::now());
        self.save(run).await?;

        tracing::warn!(run_id = %run.id, error, "checkpointed run failed");
        Ok(())
    }

    /// Restore a run record and its deserialized state.
    pub async fn restore(
        &self,
        run_id: Uuid,
    ) -> Result<(RunRecord, OutreachState), CheckpointError> {
        let run = self
            .repo
            .get_run(&run_id)
            .await
            .map_err(|e| CheckpointError::Repository(e.to_string()))?
            .ok_or(CheckpointError::RunNotFound(run_id))?;

        let state = OutreachState::from_json(run.state.clone())
            .map_err(|e| CheckpointError::Corrupt(e.to_string()))?;

        Ok((run, state))
    }

    async fn save(&self, run: &RunRecord) -> Result<(), CheckpointError> {
        self.repo
            .save_run(run)
            .await
            .map_err(|e| CheckpointError::Repository(e.to_string()))
    }
}

/// Serialize a state checkpoint, surfacing encoding failures instead of
/// persisting a partial record.
pub(crate) fn encode_state(state: &OutreachState) -> Result<serde_json::Value, CheckpointError> {
    state
        .to_json()
        .map_err(|e| CheckpointError::Corrupt(e.to_string()))
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// Underlying repository operation failed.
    #[error("checkpoint repository error: {0}")]
    Repository(String),

    /// Run not found (for restore operations).
    #[error("run not found: {0}")]
    RunNotFound(Uuid),

    /// A persisted state checkpoint failed to deserialize.
    #[error("corrupt state checkpoint: {0}")]
    Corrupt(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
