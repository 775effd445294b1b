//! Capability backends.
//!
//! Two implementations of `CapabilityProvider` from `outreach-core`:
//! - `fixture` -- deterministic in-process responses, the default and the
//!   test double of choice
//! - `http` -- remote services reached over HTTP
//!
//! `CapabilityBackend` wraps both so the engine can be instantiated from
//! config without generics leaking into the binary.

use anyhow::bail;
use outreach_core::capability::{CapabilityProvider, DraftRequest};
use outreach_types::config::{CapabilityConfig, CapabilityMode};
use outreach_types::error::CapabilityError;
use outreach_types::state::{Contact, DispatchReceipt, JobFacts};

pub mod fixture;
pub mod http;

pub use fixture::FixtureCapabilities;
pub use http::{HttpCapabilities, HttpEndpoints};

/// Config-selected capability backend.
#[derive(Debug)]
pub enum CapabilityBackend {
    Fixture(FixtureCapabilities),
    Http(HttpCapabilities),
}

impl CapabilityBackend {
    /// Build a backend from the capability section of the config file.
    ///
    /// HTTP mode requires all four endpoints to be present.
    pub fn from_config(config: &CapabilityConfig) -> anyhow::Result<Self> {
        match config.mode {
            CapabilityMode::Fixture => Ok(Self::Fixture(FixtureCapabilities::new())),
            CapabilityMode::Http => {
                let endpoints = HttpEndpoints {
                    extract: require(&config.extract_endpoint, "extract_endpoint")?,
                    contact: require(&config.contact_endpoint, "contact_endpoint")?,
                    draft: require(&config.draft_endpoint, "draft_endpoint")?,
                    dispatch: require(&config.dispatch_endpoint, "dispatch_endpoint")?,
                };
                Ok(Self::Http(HttpCapabilities::new(endpoints)?))
            }
        }
    }
}

fn require(endpoint: &Option<String>, name: &str) -> anyhow::Result<String> {
    match endpoint {
        Some(url) if !url.is_empty() => Ok(url.clone()),
        _ => bail!("capability mode 'http' requires '{name}' in config"),
    }
}

impl CapabilityProvider for CapabilityBackend {
    async fn extract_facts(&self, source_url: &str) -> Result<JobFacts, CapabilityError> {
        match self {
            Self::Fixture(c) => c.extract_facts(source_url).await,
            Self::Http(c) => c.extract_facts(source_url).await,
        }
    }

    async fn find_contact(
        &self,
        organization: &str,
        hint: &str,
    ) -> Result<Contact, CapabilityError> {
        match self {
            Self::Fixture(c) => c.find_contact(organization, hint).await,
            Self::Http(c) => c.find_contact(organization, hint).await,
        }
    }

    async fn generate_draft(
        &self,
        request: DraftRequest<'_>,
    ) -> Result<String, CapabilityError> {
        match self {
            Self::Fixture(c) => c.generate_draft(request).await,
            Self::Http(c) => c.generate_draft(request).await,
        }
    }

    async fn dispatch(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<DispatchReceipt, CapabilityError> {
        match self {
            Self::Fixture(c) => c.dispatch(recipient, subject, body).await,
            Self::Http(c) => c.dispatch(recipient, subject, body).await,
        }
    }
}

/// Compose the canonical draft layout from its parts.
///
/// The `Subject:` header line and the blank line after it are what the
/// dispatch stage later splits on.
pub(crate) fn compose_draft(
    subject: &str,
    recipient_name: &str,
    body: &str,
    call_to_action: &str,
) -> String {
    format!(
        "Subject: {subject}\n\nDear {recipient_name},\n\n{body}\n\n{call_to_action}\n\nBest regards,\n[Your Name]"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_defaults_to_fixture() {
        let backend = CapabilityBackend::from_config(&CapabilityConfig::default()).unwrap();
        assert!(matches!(backend, CapabilityBackend::Fixture(_)));
    }

    #[test]
    fn test_http_mode_requires_all_endpoints() {
        let config = CapabilityConfig {
            mode: CapabilityMode::Http,
            extract_endpoint: Some("http://localhost:9001".to_string()),
            ..Default::default()
        };
        let err = CapabilityBackend::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("contact_endpoint"));
    }

    #[test]
    fn test_compose_draft_layout() {
        let draft = compose_draft("Hello", "Jane Doe", "The body.", "Call me.");
        assert!(draft.starts_with("Subject: Hello\n\nDear Jane Doe,\n\n"));
        assert!(draft.ends_with("Best regards,\n[Your Name]"));
    }
}
