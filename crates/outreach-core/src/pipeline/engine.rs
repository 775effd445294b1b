//! The run engine: start, suspend, resume, terminate.
//!
//! `Engine` drives a run through the stage chain, checkpointing after every
//! stage. The approval gate suspends the run; `resume` reconstructs the
//! state from the checkpoint, records the human's decision, and drives the
//! remainder of the chain. A process restart between suspend and resume is
//! invisible to the caller.

use outreach_types::run::{Disposition, RunRecord, RunStatus, StageId, SuspendPayload};
use outreach_types::state::{OutreachState, StageUpdate, StateError};
use uuid::Uuid;

use crate::capability::CapabilityProvider;
use crate::pipeline::approval;
use crate::pipeline::checkpoint::{self, CheckpointError, CheckpointManager};
use crate::pipeline::router::{self, Next};
use crate::pipeline::stage::{self, StageOutcome};
use crate::repository::RunRepository;

// ---------------------------------------------------------------------------
// Requests and outcomes
// ---------------------------------------------------------------------------

/// Inputs to start a new run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// The initiating message; doubles as the posting URL when none is given.
    pub message: String,
    /// Explicit posting URL, overriding the message-derived one.
    pub source_url: Option<String>,
    /// Content brief for the product being pitched.
    pub brief: String,
}

/// What a `start` or `resume` call produced.
#[derive(Debug)]
pub enum RunOutcome {
    /// The run is parked at the approval gate.
    Suspended {
        run_id: Uuid,
        payload: SuspendPayload,
    },
    /// The run reached a terminal stage.
    Completed {
        run_id: Uuid,
        disposition: Disposition,
        state: OutreachState,
    },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A stage failed; the run is checkpointed as `Failed`.
    #[error("run {run_id} failed at stage '{stage}': {error}")]
    StageFailed {
        run_id: Uuid,
        stage: StageId,
        error: String,
    },

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("run not found: {0}")]
    RunNotFound(Uuid),

    /// Resume was called on a run that is not parked.
    #[error("run {run_id} is not suspended (status: {status})")]
    NotSuspended { run_id: Uuid, status: RunStatus },

    #[error(transparent)]
    State(#[from] StateError),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Drives runs through the stage chain with durable checkpoints.
///
/// Generic over the capability provider and the run repository so tests can
/// use in-memory doubles for both.
pub struct Engine<P: CapabilityProvider, R: RunRepository> {
    caps: P,
    checkpoint: CheckpointManager<R>,
}

impl<P: CapabilityProvider, R: RunRepository> Engine<P, R> {
    pub fn new(caps: P, checkpoint: CheckpointManager<R>) -> Self {
        Self { caps, checkpoint }
    }

    /// Access the checkpoint manager (and through it, the repository).
    pub fn checkpoint(&self) -> &CheckpointManager<R> {
        &self.checkpoint
    }

    /// Start a new run and drive it until it suspends, completes, or fails.
    pub async fn start(&self, request: RunRequest) -> Result<RunOutcome, EngineError> {
        let mut state = OutreachState::new(request.message);
        let seed = StageUpdate {
            source_url: request.source_url,
            brief: Some(request.brief),
            ..Default::default()
        };
        state.apply(seed)?;

        let mut run = RunRecord {
            id: Uuid::now_v7(),
            status: RunStatus::Running,
            stage: None,
            state: checkpoint::encode_state(&state)?,
            prompt: None,
            disposition: None,
            error: None,
            started_at: chrono::Utc::now(),
            completed_at: None,
        };
        self.checkpoint.create(&run).await?;

        tracing::info!(run_id = %run.id, "run started");

        self.drive(&mut run, &mut state, router::FIRST_STAGE).await
    }

    /// Resume a suspended run with the human's decision token.
    ///
    /// Only a case-insensitive "yes" approves; any other token (or garbage)
    /// rejects and the run completes as `Rejected`.
    pub async fn resume(&self, run_id: Uuid, token: &str) -> Result<RunOutcome, EngineError> {
        // The Suspended -> Running transition is a compare and swap in
        // storage; of concurrent resume calls for the same run, exactly one
        // proceeds past this point.
        if !self.checkpoint.claim_suspended(run_id).await? {
            let status = match self.checkpoint.restore(run_id).await {
                Ok((run, _)) => run.status,
                Err(CheckpointError::RunNotFound(id)) => return Err(EngineError::RunNotFound(id)),
                Err(e) => return Err(e.into()),
            };
            return Err(EngineError::NotSuspended { run_id, status });
        }

        let (mut run, mut state) = match self.checkpoint.restore(run_id).await {
            Ok(pair) => pair,
            Err(CheckpointError::RunNotFound(id)) => return Err(EngineError::RunNotFound(id)),
            Err(e) => return Err(e.into()),
        };

        let approved = approval::interpret(token);
        tracing::info!(run_id = %run_id, approved, "run resumed");

        state.apply(approval::decision_update(approved))?;
        self.checkpoint
            .checkpoint_stage(&mut run, StageId::Approve, &state)
            .await?;

        match router::next_stage(StageId::Approve, &state) {
            Next::Stage(next) => self.drive(&mut run, &mut state, next).await,
            Next::Terminal => self.finish(&mut run, state).await,
        }
    }

    /// Execute stages from `stage` until a suspension or a terminal.
    async fn drive(
        &self,
        run: &mut RunRecord,
        state: &mut OutreachState,
        stage: StageId,
    ) -> Result<RunOutcome, EngineError> {
        let mut current = stage;
        loop {
            let outcome = match stage::execute(current, state, &self.caps).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    let message = err.to_string();
                    self.checkpoint
                        .checkpoint_failed(run, state, &message)
                        .await?;
                    return Err(EngineError::StageFailed {
                        run_id: run.id,
                        stage: current,
                        error: message,
                    });
                }
            };

            match outcome {
                StageOutcome::Suspend(payload) => {
                    self.checkpoint
                        .checkpoint_suspended(run, current, state, &payload.prompt)
                        .await?;
                    return Ok(RunOutcome::Suspended {
                        run_id: run.id,
                        payload,
                    });
                }
                StageOutcome::Advance(update) => {
                    state.apply(update)?;
                    self.checkpoint
                        .checkpoint_stage(run, current, state)
                        .await?;

                    match router::next_stage(current, state) {
                        Next::Stage(next) => current = next,
                        Next::Terminal => return self.finish(run, state.clone()).await,
                    }
                }
            }
        }
    }

    /// Record the terminal outcome for a run whose chain has ended.
    async fn finish(
        &self,
        run: &mut RunRecord,
        state: OutreachState,
    ) -> Result<RunOutcome, EngineError> {
        let disposition = disposition_for(&state);
        self.checkpoint
            .checkpoint_completed(run, &state, disposition)
            .await?;
        Ok(RunOutcome::Completed {
            run_id: run.id,
            disposition,
            state,
        })
    }
}

/// Derive the terminal disposition from the final state.
fn disposition_for(state: &OutreachState) -> Disposition {
    if state.approval != Some(true) {
        return Disposition::Rejected;
    }
    if state.dispatched == Some(true) {
        return Disposition::Sent;
    }
    // Approved but not sent: distinguish the missing-recipient outcome from
    // a provider failure.
    let has_recipient = state
        .contact
        .as_ref()
        .is_some_and(|c| c.email.is_some());
    if has_recipient {
        Disposition::SendFailed
    } else {
        Disposition::NoRecipient
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
