//! Capability provider trait definition.
//!
//! The pipeline's side-effecting work (extracting job facts, looking up a
//! contact, drafting the email, sending it) goes through this trait. The
//! infrastructure layer (outreach-infra) ships an HTTP-backed implementation
//! and a deterministic fixture implementation.

use outreach_types::error::CapabilityError;
use outreach_types::state::{Contact, DispatchReceipt, JobFacts};

/// Inputs to the drafting capability.
#[derive(Debug, Clone)]
pub struct DraftRequest<'a> {
    /// Facts extracted from the job posting.
    pub facts: &'a JobFacts,
    /// The recipient the draft is addressed to.
    pub contact: &'a Contact,
    /// Content brief for the product being pitched.
    pub brief: &'a str,
}

/// External capabilities the pipeline stages call into.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait CapabilityProvider: Send + Sync {
    /// Extract structured facts from the job posting at `source_url`.
    fn extract_facts(
        &self,
        source_url: &str,
    ) -> impl std::future::Future<Output = Result<JobFacts, CapabilityError>> + Send;

    /// Find a contact at `organization`, preferring people matching `hint`.
    fn find_contact(
        &self,
        organization: &str,
        hint: &str,
    ) -> impl std::future::Future<Output = Result<Contact, CapabilityError>> + Send;

    /// Generate a personalized outreach email draft.
    fn generate_draft(
        &self,
        request: DraftRequest<'_>,
    ) -> impl std::future::Future<Output = Result<String, CapabilityError>> + Send;

    /// Send the email. An `Err` here means the provider itself failed; a
    /// delivered-but-bounced outcome comes back as a receipt with
    /// `success: false`.
    fn dispatch(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> impl std::future::Future<Output = Result<DispatchReceipt, CapabilityError>> + Send;
}
