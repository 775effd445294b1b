//! Run records and pipeline stage identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a pipeline stage. The pipeline is a fixed linear chain in
/// this order; stages never repeat within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Extract,
    FindContact,
    GenerateDraft,
    Approve,
    Dispatch,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Extract => "extract",
            StageId::FindContact => "find_contact",
            StageId::GenerateDraft => "generate_draft",
            StageId::Approve => "approve",
            StageId::Dispatch => "dispatch",
        }
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extract" => Ok(StageId::Extract),
            "find_contact" => Ok(StageId::FindContact),
            "generate_draft" => Ok(StageId::GenerateDraft),
            "approve" => Ok(StageId::Approve),
            "dispatch" => Ok(StageId::Dispatch),
            other => Err(format!("unknown stage: {other}")),
        }
    }
}

/// Persisted lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Actively executing stages.
    Running,
    /// Parked awaiting a human decision; survives process restarts.
    Suspended,
    /// Reached a terminal stage; see `disposition` for the outcome.
    Completed,
    /// A stage failed with an unrecoverable error.
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Suspended => "suspended",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "suspended" => Ok(RunStatus::Suspended),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// How a completed run ended. Distinguishes the four terminal outcomes of
/// the pipeline; a failed run carries an error instead of a disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Approved and the email went out.
    Sent,
    /// Approved but the provider could not deliver it.
    SendFailed,
    /// The human declined the draft.
    Rejected,
    /// Approved but no recipient address was found.
    NoRecipient,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Sent => "sent",
            Disposition::SendFailed => "send_failed",
            Disposition::Rejected => "rejected",
            Disposition::NoRecipient => "no_recipient",
        }
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Disposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(Disposition::Sent),
            "send_failed" => Ok(Disposition::SendFailed),
            "rejected" => Ok(Disposition::Rejected),
            "no_recipient" => Ok(Disposition::NoRecipient),
            other => Err(format!("unknown disposition: {other}")),
        }
    }
}

/// Persisted record of a run. One row per run; the `state` column holds the
/// full serialized `OutreachState` checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub status: RunStatus,
    /// The last stage that completed, or the stage the run is suspended at.
    pub stage: Option<StageId>,
    /// Serialized `OutreachState` checkpoint.
    pub state: serde_json::Value,
    /// Prompt shown to the human while suspended.
    pub prompt: Option<String>,
    pub disposition: Option<Disposition>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// What a suspended run surfaces to the human reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendPayload {
    /// Question to put to the reviewer.
    pub prompt: String,
    /// The draft email awaiting review.
    pub draft: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_id_roundtrip() {
        for stage in [
            StageId::Extract,
            StageId::FindContact,
            StageId::GenerateDraft,
            StageId::Approve,
            StageId::Dispatch,
        ] {
            let parsed: StageId = stage.as_str().parse().unwrap();
            assert_eq!(parsed, stage);
        }
        assert!("bogus".parse::<StageId>().is_err());
    }

    #[test]
    fn test_status_and_disposition_strings() {
        assert_eq!(RunStatus::Suspended.to_string(), "suspended");
        assert_eq!(
            "suspended".parse::<RunStatus>().unwrap(),
            RunStatus::Suspended
        );
        assert_eq!(Disposition::NoRecipient.to_string(), "no_recipient");
        assert_eq!(
            "send_failed".parse::<Disposition>().unwrap(),
            Disposition::SendFailed
        );
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&StageId::GenerateDraft).unwrap();
        assert_eq!(json, "\"generate_draft\"");
        let json = serde_json::to_string(&Disposition::SendFailed).unwrap();
        assert_eq!(json, "\"send_failed\"");
    }
}
