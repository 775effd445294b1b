//! Resume token interpretation for the approval gate.
//!
//! The gate is deliberately strict: only an affirmative token approves, and
//! anything else (including garbage or an empty string) rejects. Resuming a
//! run can therefore never accidentally send an email.

use outreach_types::state::{ConversationEntry, StageUpdate};

/// Prompt surfaced to the human reviewer while a run is suspended.
pub const APPROVAL_PROMPT: &str = "Please review the generated email content. \
    Do you approve sending this email? (Type 'yes' to approve, 'no' to reject)";

/// Interpret a resume token. Only a case-insensitive "yes" (after trimming
/// surrounding whitespace) approves; everything else rejects.
pub fn interpret(token: &str) -> bool {
    token.trim().eq_ignore_ascii_case("yes")
}

/// Build the state update recording the human's decision.
pub fn decision_update(approved: bool) -> StageUpdate {
    let note = if approved {
        "Email approved by human."
    } else {
        "Email rejected by human. Workflow terminated."
    };
    StageUpdate {
        approval: Some(approved),
        conversation: vec![ConversationEntry::assistant(note)],
        ..Default::default()
    }
}
