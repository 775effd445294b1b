//! Per-stage execution.
//!
//! Each stage reads from the shared state, calls at most one capability, and
//! returns either a partial state update or a suspension payload. Stages
//! never mutate state directly and never talk to storage; the engine owns
//! both.

use outreach_types::error::CapabilityError;
use outreach_types::run::{StageId, SuspendPayload};
use outreach_types::state::{ConversationEntry, OutreachState, StageUpdate};

use crate::capability::{CapabilityProvider, DraftRequest};
use crate::pipeline::approval::APPROVAL_PROMPT;

/// Hint passed to contact lookup; outreach targets decision makers.
const CONTACT_HINT: &str = "senior executive";

/// What a stage produced.
#[derive(Debug)]
pub enum StageOutcome {
    /// The stage finished; merge this update and route onward.
    Advance(StageUpdate),
    /// The stage needs a human decision; park the run.
    Suspend(SuspendPayload),
}

/// Errors that halt a run at a stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// A field an earlier stage should have populated is missing.
    #[error("stage '{stage}' precondition failed: '{field}' is not set")]
    Precondition {
        stage: StageId,
        field: &'static str,
    },

    /// The stage's capability call failed.
    #[error("stage '{stage}' capability call failed: {source}")]
    Capability {
        stage: StageId,
        #[source]
        source: CapabilityError,
    },
}

/// Execute one stage against the current state.
pub async fn execute<P: CapabilityProvider>(
    stage: StageId,
    state: &OutreachState,
    caps: &P,
) -> Result<StageOutcome, StageError> {
    match stage {
        StageId::Extract => extract(state, caps).await,
        StageId::FindContact => find_contact(state, caps).await,
        StageId::GenerateDraft => generate_draft(state, caps).await,
        StageId::Approve => approve(state),
        StageId::Dispatch => dispatch(state, caps).await,
    }
}

async fn extract<P: CapabilityProvider>(
    state: &OutreachState,
    caps: &P,
) -> Result<StageOutcome, StageError> {
    // The posting URL is either seeded explicitly or taken from the
    // initiating message.
    let url = state
        .source_url
        .clone()
        .or_else(|| state.first_human_message().map(str::to_string))
        .ok_or(StageError::Precondition {
            stage: StageId::Extract,
            field: "source_url",
        })?;

    let facts = caps
        .extract_facts(&url)
        .await
        .map_err(|source| StageError::Capability {
            stage: StageId::Extract,
            source,
        })?;

    tracing::debug!(url, title = %facts.title, "extracted job facts");

    let note = format!(
        "Job details extracted for {} at {}.",
        facts.title, facts.organization
    );
    Ok(StageOutcome::Advance(StageUpdate {
        source_url: Some(url),
        job_facts: Some(facts),
        conversation: vec![ConversationEntry::assistant(note)],
        ..Default::default()
    }))
}

async fn find_contact<P: CapabilityProvider>(
    state: &OutreachState,
    caps: &P,
) -> Result<StageOutcome, StageError> {
    let facts = state.job_facts.as_ref().ok_or(StageError::Precondition {
        stage: StageId::FindContact,
        field: "job_facts",
    })?;

    let contact = caps
        .find_contact(&facts.organization, CONTACT_HINT)
        .await
        .map_err(|source| StageError::Capability {
            stage: StageId::FindContact,
            source,
        })?;

    tracing::debug!(
        organization = %facts.organization,
        contact = %contact.name,
        "found contact"
    );

    let note = format!(
        "Contact information found for {} at {}.",
        contact.name, facts.organization
    );
    Ok(StageOutcome::Advance(StageUpdate {
        contact: Some(contact),
        conversation: vec![ConversationEntry::assistant(note)],
        ..Default::default()
    }))
}

async fn generate_draft<P: CapabilityProvider>(
    state: &OutreachState,
    caps: &P,
) -> Result<StageOutcome, StageError> {
    let facts = state.job_facts.as_ref().ok_or(StageError::Precondition {
        stage: StageId::GenerateDraft,
        field: "job_facts",
    })?;
    let contact = state.contact.as_ref().ok_or(StageError::Precondition {
        stage: StageId::GenerateDraft,
        field: "contact",
    })?;
    let brief = state.brief.as_deref().ok_or(StageError::Precondition {
        stage: StageId::GenerateDraft,
        field: "brief",
    })?;

    let draft = caps
        .generate_draft(DraftRequest {
            facts,
            contact,
            brief,
        })
        .await
        .map_err(|source| StageError::Capability {
            stage: StageId::GenerateDraft,
            source,
        })?;

    tracing::debug!(draft_len = draft.len(), "generated draft");

    Ok(StageOutcome::Advance(StageUpdate {
        draft: Some(draft),
        conversation: vec![ConversationEntry::assistant(
            "Email content generated and ready for human approval.",
        )],
        ..Default::default()
    }))
}

fn approve(state: &OutreachState) -> Result<StageOutcome, StageError> {
    let draft = state.draft.as_ref().ok_or(StageError::Precondition {
        stage: StageId::Approve,
        field: "draft",
    })?;

    Ok(StageOutcome::Suspend(SuspendPayload {
        prompt: APPROVAL_PROMPT.to_string(),
        draft: draft.clone(),
    }))
}

async fn dispatch<P: CapabilityProvider>(
    state: &OutreachState,
    caps: &P,
) -> Result<StageOutcome, StageError> {
    let draft = state.draft.as_ref().ok_or(StageError::Precondition {
        stage: StageId::Dispatch,
        field: "draft",
    })?;
    let contact = state.contact.as_ref().ok_or(StageError::Precondition {
        stage: StageId::Dispatch,
        field: "contact",
    })?;

    // A missing recipient address is a normal business outcome, not an
    // error: the run completes with a failed dispatch.
    let Some(recipient) = contact.email.as_deref() else {
        tracing::info!(contact = %contact.name, "no recipient address; skipping send");
        return Ok(StageOutcome::Advance(StageUpdate {
            dispatched: Some(false),
            conversation: vec![ConversationEntry::assistant(
                "Email not sent: Recipient email address not found.",
            )],
            ..Default::default()
        }));
    };

    let (subject, body) = split_draft(draft);

    match caps.dispatch(recipient, &subject, &body).await {
        Ok(receipt) => {
            tracing::info!(recipient, success = receipt.success, "dispatch attempted");
            Ok(StageOutcome::Advance(StageUpdate {
                dispatched: Some(receipt.success),
                conversation: vec![ConversationEntry::assistant(format!(
                    "Email sending status: {}",
                    receipt.message
                ))],
                ..Default::default()
            }))
        }
        // Provider failure at the final stage is absorbed as a failed send:
        // the approval already happened and the run outcome must record it.
        Err(err) => {
            tracing::warn!(recipient, error = %err, "dispatch provider failed");
            Ok(StageOutcome::Advance(StageUpdate {
                dispatched: Some(false),
                conversation: vec![ConversationEntry::assistant(format!(
                    "Email sending status: {err}"
                ))],
                ..Default::default()
            }))
        }
    }
}

/// Split a draft into subject and body.
///
/// Drafts follow the `Subject: ...` convention with a blank line before the
/// body; anything else gets the whole text as body under "No Subject".
fn split_draft(draft: &str) -> (String, String) {
    if let Some(rest) = draft.strip_prefix("Subject: ") {
        if let Some((subject, body)) = rest.split_once("\n\n") {
            return (subject.trim().to_string(), body.to_string());
        }
        return (rest.trim().to_string(), String::new());
    }
    ("No Subject".to_string(), draft.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_types::state::{Contact, DispatchReceipt, JobFacts};

    /// Minimal provider for stage-level tests. Knobs control the contact's
    /// email and whether dispatch reports success.
    struct TestProvider {
        contact_email: Option<String>,
        dispatch_ok: bool,
        fail_extract: bool,
    }

    impl Default for TestProvider {
        fn default() -> Self {
            Self {
                contact_email: Some("jane@acme.com".to_string()),
                dispatch_ok: true,
                fail_extract: false,
            }
        }
    }

    impl CapabilityProvider for TestProvider {
        async fn extract_facts(&self, _source_url: &str) -> Result<JobFacts, CapabilityError> {
            if self.fail_extract {
                return Err(CapabilityError::Unavailable {
                    capability: "extract".to_string(),
                    message: "scraper down".to_string(),
                });
            }
            Ok(JobFacts {
                title: "Backend Engineer".to_string(),
                compensation: None,
                duration: None,
                skills: vec!["Rust".to_string()],
                organization: "Acme Robotics".to_string(),
            })
        }

        async fn find_contact(
            &self,
            _organization: &str,
            _hint: &str,
        ) -> Result<Contact, CapabilityError> {
            Ok(Contact {
                name: "Jane Doe".to_string(),
                email: self.contact_email.clone(),
                profile_url: None,
                title: Some("CTO".to_string()),
            })
        }

        async fn generate_draft(
            &self,
            request: DraftRequest<'_>,
        ) -> Result<String, CapabilityError> {
            Ok(format!(
                "Subject: Regarding {}\n\nDear {},\n\nHello.",
                request.facts.title, request.contact.name
            ))
        }

        async fn dispatch(
            &self,
            _recipient: &str,
            _subject: &str,
            _body: &str,
        ) -> Result<DispatchReceipt, CapabilityError> {
            Ok(DispatchReceipt {
                success: self.dispatch_ok,
                message: if self.dispatch_ok {
                    "Email sent successfully.".to_string()
                } else {
                    "Mailbox rejected the message.".to_string()
                },
            })
        }
    }

    fn state_through_draft() -> OutreachState {
        let mut state = OutreachState::new("https://jobs.example/1");
        state
            .apply(StageUpdate {
                brief: Some("We sell tools.".to_string()),
                job_facts: Some(JobFacts {
                    title: "Backend Engineer".to_string(),
                    compensation: None,
                    duration: None,
                    skills: vec![],
                    organization: "Acme Robotics".to_string(),
                }),
                contact: Some(Contact {
                    name: "Jane Doe".to_string(),
                    email: Some("jane@acme.com".to_string()),
                    profile_url: None,
                    title: None,
                }),
                draft: Some("Subject: Hi\n\nDear Jane,\n\nHello.".to_string()),
                ..Default::default()
            })
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_extract_takes_url_from_initial_message() {
        let state = OutreachState::new("https://jobs.example/1");
        let outcome = execute(StageId::Extract, &state, &TestProvider::default())
            .await
            .unwrap();
        let StageOutcome::Advance(update) = outcome else {
            panic!("extract should advance");
        };
        assert_eq!(update.source_url.as_deref(), Some("https://jobs.example/1"));
        assert_eq!(update.job_facts.unwrap().organization, "Acme Robotics");
        assert_eq!(
            update.conversation[0].text,
            "Job details extracted for Backend Engineer at Acme Robotics."
        );
    }

    #[tokio::test]
    async fn test_extract_capability_failure_is_a_stage_error() {
        let state = OutreachState::new("https://jobs.example/1");
        let provider = TestProvider {
            fail_extract: true,
            ..Default::default()
        };
        let err = execute(StageId::Extract, &state, &provider)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StageError::Capability {
                stage: StageId::Extract,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_find_contact_requires_job_facts() {
        let state = OutreachState::new("hi");
        let err = execute(StageId::FindContact, &state, &TestProvider::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StageError::Precondition {
                stage: StageId::FindContact,
                field: "job_facts",
            }
        ));
    }

    #[tokio::test]
    async fn test_approve_suspends_with_draft_and_prompt() {
        let state = state_through_draft();
        let outcome = execute(StageId::Approve, &state, &TestProvider::default())
            .await
            .unwrap();
        let StageOutcome::Suspend(payload) = outcome else {
            panic!("approve should suspend");
        };
        assert!(payload.prompt.contains("approve sending this email"));
        assert_eq!(payload.draft, state.draft.unwrap());
    }

    #[tokio::test]
    async fn test_dispatch_without_recipient_completes_with_failed_send() {
        let mut state = state_through_draft();
        state.contact.as_mut().unwrap().email = None;
        let outcome = execute(StageId::Dispatch, &state, &TestProvider::default())
            .await
            .unwrap();
        let StageOutcome::Advance(update) = outcome else {
            panic!("dispatch should advance");
        };
        assert_eq!(update.dispatched, Some(false));
        assert_eq!(
            update.conversation[0].text,
            "Email not sent: Recipient email address not found."
        );
    }

    #[tokio::test]
    async fn test_dispatch_records_receipt_outcome() {
        let state = state_through_draft();

        let outcome = execute(StageId::Dispatch, &state, &TestProvider::default())
            .await
            .unwrap();
        let StageOutcome::Advance(update) = outcome else {
            panic!()
        };
        assert_eq!(update.dispatched, Some(true));
        assert!(update.conversation[0].text.starts_with("Email sending status:"));

        let provider = TestProvider {
            dispatch_ok: false,
            ..Default::default()
        };
        let outcome = execute(StageId::Dispatch, &state, &provider).await.unwrap();
        let StageOutcome::Advance(update) = outcome else {
            panic!()
        };
        assert_eq!(update.dispatched, Some(false));
    }

    #[test]
    fn test_split_draft() {
        let (subject, body) = split_draft("Subject: Hello there\n\nDear Jane,\n\nBody.");
        assert_eq!(subject, "Hello there");
        assert_eq!(body, "Dear Jane,\n\nBody.");

        let (subject, body) = split_draft("no header at all");
        assert_eq!(subject, "No Subject");
        assert_eq!(body, "no header at all");
    }
}
