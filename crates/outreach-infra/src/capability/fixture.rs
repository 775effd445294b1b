//! Deterministic fixture capability provider.
//!
//! Answers every capability call with canned data derived from the inputs,
//! no network involved. The default backend for local use and the test
//! double for CLI and HTTP integration tests. Builder knobs flip the
//! interesting failure modes; atomic counters record what was called.

use std::sync::atomic::{AtomicUsize, Ordering};

use outreach_core::capability::{CapabilityProvider, DraftRequest};
use outreach_types::error::CapabilityError;
use outreach_types::state::{Contact, DispatchReceipt, JobFacts};

use super::compose_draft;

/// In-process capability provider with deterministic responses.
#[derive(Debug, Default)]
pub struct FixtureCapabilities {
    missing_email: bool,
    failing_dispatch: bool,
    unavailable: Option<&'static str>,
    pub extract_calls: AtomicUsize,
    pub contact_calls: AtomicUsize,
    pub draft_calls: AtomicUsize,
    pub dispatch_calls: AtomicUsize,
}

impl FixtureCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contact lookups return no email address.
    pub fn with_missing_email(mut self) -> Self {
        self.missing_email = true;
        self
    }

    /// Dispatch reports a delivery failure instead of success.
    pub fn with_failing_dispatch(mut self) -> Self {
        self.failing_dispatch = true;
        self
    }

    /// The named capability errors as unavailable.
    pub fn with_unavailable(mut self, capability: &'static str) -> Self {
        self.unavailable = Some(capability);
        self
    }

    fn check_available(&self, capability: &'static str) -> Result<(), CapabilityError> {
        if self.unavailable == Some(capability) {
            return Err(CapabilityError::Unavailable {
                capability: capability.to_string(),
                message: "fixture configured as unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl CapabilityProvider for FixtureCapabilities {
    async fn extract_facts(&self, source_url: &str) -> Result<JobFacts, CapabilityError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available("extract")?;

        tracing::debug!(source_url, "fixture extract");
        Ok(JobFacts {
            title: "Backend Engineer".to_string(),
            compensation: Some("$140k-$170k".to_string()),
            duration: Some("Full-time".to_string()),
            skills: vec![
                "Rust".to_string(),
                "SQL".to_string(),
                "Distributed systems".to_string(),
            ],
            organization: "Acme Robotics".to_string(),
        })
    }

    async fn find_contact(
        &self,
        organization: &str,
        _hint: &str,
    ) -> Result<Contact, CapabilityError> {
        self.contact_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available("find_contact")?;

        tracing::debug!(organization, "fixture contact lookup");
        Ok(Contact {
            name: "Jane Doe".to_string(),
            email: if self.missing_email {
                None
            } else {
                Some("jane.doe@acme-robotics.example".to_string())
            },
            profile_url: Some("https://linkedin.example/in/janedoe".to_string()),
            title: Some("CTO".to_string()),
        })
    }

    async fn generate_draft(
        &self,
        request: DraftRequest<'_>,
    ) -> Result<String, CapabilityError> {
        self.draft_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available("generate_draft")?;

        let subject = format!(
            "Supporting your {} hiring at {}",
            request.facts.title, request.facts.organization
        );
        let body = format!(
            "I saw that {} is hiring a {}. {}",
            request.facts.organization, request.facts.title, request.brief
        );
        Ok(compose_draft(
            &subject,
            &request.contact.name,
            &body,
            "Would you be open to a short call next week?",
        ))
    }

    async fn dispatch(
        &self,
        recipient: &str,
        _subject: &str,
        _body: &str,
    ) -> Result<DispatchReceipt, CapabilityError> {
        self.dispatch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available("dispatch")?;

        tracing::debug!(recipient, "fixture dispatch");
        Ok(if self.failing_dispatch {
            DispatchReceipt {
                success: false,
                message: format!("Delivery to {recipient} failed: mailbox unavailable."),
            }
        } else {
            DispatchReceipt {
                success: true,
                message: format!("Email sent successfully to {recipient}."),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_happy_path_shapes() {
        let caps = FixtureCapabilities::new();

        let facts = caps.extract_facts("https://jobs.example/1").await.unwrap();
        assert_eq!(facts.organization, "Acme Robotics");

        let contact = caps.find_contact("Acme Robotics", "cto").await.unwrap();
        assert!(contact.email.is_some());

        let draft = caps
            .generate_draft(DraftRequest {
                facts: &facts,
                contact: &contact,
                brief: "We sell tools.",
            })
            .await
            .unwrap();
        assert!(draft.starts_with("Subject: "));
        assert!(draft.contains("Dear Jane Doe,"));
        assert!(draft.contains("We sell tools."));

        let receipt = caps
            .dispatch("jane@acme.example", "Hi", "Body")
            .await
            .unwrap();
        assert!(receipt.success);
        assert_eq!(caps.dispatch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fixture_knobs() {
        let caps = FixtureCapabilities::new().with_missing_email();
        let contact = caps.find_contact("Acme", "cto").await.unwrap();
        assert!(contact.email.is_none());

        let caps = FixtureCapabilities::new().with_failing_dispatch();
        let receipt = caps.dispatch("x@y.example", "s", "b").await.unwrap();
        assert!(!receipt.success);

        let caps = FixtureCapabilities::new().with_unavailable("extract");
        let err = caps.extract_facts("url").await.unwrap_err();
        assert!(matches!(err, CapabilityError::Unavailable { .. }));
    }
}
