//! Stage routing.
//!
//! The pipeline is a fixed linear chain with one branch: after the approval
//! gate, an approved run proceeds to dispatch and a rejected run terminates.

use outreach_types::run::StageId;
use outreach_types::state::OutreachState;

/// Where the engine goes after a stage completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Stage(StageId),
    Terminal,
}

/// The stage that begins every run.
pub const FIRST_STAGE: StageId = StageId::Extract;

/// Route from a completed stage to the next one.
///
/// Only `Approve` consults the state: the recorded approval decision picks
/// between dispatch and termination.
pub fn next_stage(completed: StageId, state: &OutreachState) -> Next {
    match completed {
        StageId::Extract => Next::Stage(StageId::FindContact),
        StageId::FindContact => Next::Stage(StageId::GenerateDraft),
        StageId::GenerateDraft => Next::Stage(StageId::Approve),
        StageId::Approve => {
            if state.approval == Some(true) {
                Next::Stage(StageId::Dispatch)
            } else {
                Next::Terminal
            }
        }
        StageId::Dispatch => Next::Terminal,
    }
}
