//! Shared run state threaded through every pipeline stage.
//!
//! `OutreachState` is the single mutable record for one workflow run. Stages
//! never mutate it directly: each stage returns a `StageUpdate` that the
//! engine merges field-by-field via [`OutreachState::apply`], which enforces
//! the write-once rule for every field except the append-only conversation.
//! The state serializes to a flat JSON record so a suspended run can be
//! persisted and reconstructed after a process restart.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Who produced a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Human,
    Assistant,
}

/// One entry in the run's conversation log. Insertion order is the causal
/// order of pipeline events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub text: String,
}

impl ConversationEntry {
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Capability data shapes
// ---------------------------------------------------------------------------

/// Structured facts extracted from a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFacts {
    /// The job title.
    pub title: String,
    /// Pay or salary range, if stated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensation: Option<String>,
    /// Contract duration, if stated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Required skills.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Name of the hiring organization.
    pub organization: String,
}

/// Contact details for a person at the hiring organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Result of an email dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    pub success: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// OutreachState
// ---------------------------------------------------------------------------

/// The mutable shared state for one outreach run.
///
/// Created once at run start from the initiating message, carried across any
/// suspension, and discarded when the run reaches a terminal stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachState {
    /// Ordered conversation log, append-only.
    #[serde(default)]
    pub conversation: Vec<ConversationEntry>,
    /// URL identifying the job posting; set once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Content brief describing the product being pitched; seeded at start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
    /// Populated by the Extract stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_facts: Option<JobFacts>,
    /// Populated by the FindContact stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// Populated by the GenerateDraft stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
    /// Set only through the suspend/resume protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<bool>,
    /// Set only by the Dispatch stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatched: Option<bool>,
}

impl OutreachState {
    /// Create a fresh state seeded with the initiating human message.
    pub fn new(initial_message: impl Into<String>) -> Self {
        Self {
            conversation: vec![ConversationEntry::human(initial_message)],
            source_url: None,
            brief: None,
            job_facts: None,
            contact: None,
            draft: None,
            approval: None,
            dispatched: None,
        }
    }

    /// The first human message, used to derive `source_url` when it was not
    /// seeded explicitly.
    pub fn first_human_message(&self) -> Option<&str> {
        self.conversation
            .iter()
            .find(|e| e.role == Role::Human)
            .map(|e| e.text.as_str())
    }

    /// Merge a stage's partial update into the state.
    ///
    /// Every field is write-once: setting an already-populated field to a
    /// different value is an error. Re-setting the identical value is
    /// accepted so a stage may echo inputs it derived. Conversation entries
    /// are always appended.
    pub fn apply(&mut self, update: StageUpdate) -> Result<(), StateError> {
        set_once(&mut self.source_url, update.source_url, "source_url")?;
        set_once(&mut self.brief, update.brief, "brief")?;
        set_once(&mut self.job_facts, update.job_facts, "job_facts")?;
        set_once(&mut self.contact, update.contact, "contact")?;
        set_once(&mut self.draft, update.draft, "draft")?;
        set_once(&mut self.approval, update.approval, "approval")?;
        set_once(&mut self.dispatched, update.dispatched, "dispatched")?;
        self.conversation.extend(update.conversation);
        Ok(())
    }

    /// Serialize the state to JSON for checkpointing.
    ///
    /// A failure here must surface to the caller: checkpointing anything but
    /// the full state would wipe the run on restore.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Restore a state from a JSON checkpoint.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Set an optional field exactly once, tolerating idempotent re-writes.
fn set_once<T: PartialEq>(
    slot: &mut Option<T>,
    value: Option<T>,
    field: &'static str,
) -> Result<(), StateError> {
    match value {
        None => Ok(()),
        Some(v) => match slot {
            Some(existing) if *existing == v => Ok(()),
            Some(_) => Err(StateError::FieldAlreadySet { field }),
            None => {
                *slot = Some(v);
                Ok(())
            }
        },
    }
}

// ---------------------------------------------------------------------------
// StageUpdate
// ---------------------------------------------------------------------------

/// A stage's partial state update, merged field-by-field by
/// [`OutreachState::apply`]. Never a full replacement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_facts: Option<JobFacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatched: Option<bool>,
    /// Conversation entries appended by the stage.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversation: Vec<ConversationEntry>,
}

// ---------------------------------------------------------------------------
// StateError
// ---------------------------------------------------------------------------

/// Violations of the state merge rules.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// A stage attempted to overwrite a field another stage already set.
    #[error("field '{field}' is already set and cannot be overwritten")]
    FieldAlreadySet { field: &'static str },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
