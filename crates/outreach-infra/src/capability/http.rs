//! HTTP capability provider.
//!
//! Calls four remote services, one per capability. Each service takes a
//! small JSON request and returns a JSON body; the wire shapes live here and
//! never leak past the `CapabilityProvider` boundary.
//!
//! Error mapping: transport failures are `Unavailable`, non-2xx statuses are
//! `Rejected`, and undecodable bodies are `InvalidResponse`.

use serde::{Deserialize, Serialize};

use outreach_core::capability::{CapabilityProvider, DraftRequest};
use outreach_types::error::CapabilityError;
use outreach_types::state::{Contact, DispatchReceipt, JobFacts};

use super::compose_draft;

/// Per-capability base URLs.
#[derive(Debug, Clone)]
pub struct HttpEndpoints {
    pub extract: String,
    pub contact: String,
    pub draft: String,
    pub dispatch: String,
}

/// Capability provider backed by remote HTTP services.
#[derive(Debug)]
pub struct HttpCapabilities {
    endpoints: HttpEndpoints,
    http: reqwest::Client,
}

impl HttpCapabilities {
    pub fn new(endpoints: HttpEndpoints) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("outreach/0.1")
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self { endpoints, http })
    }

    /// POST a JSON request and decode a JSON response, with the shared
    /// error mapping.
    async fn post<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        capability: &str,
        url: &str,
        request: &Req,
    ) -> Result<Resp, CapabilityError> {
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| CapabilityError::Unavailable {
                capability: capability.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Rejected {
                capability: capability.to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        response
            .json()
            .await
            .map_err(|e| CapabilityError::InvalidResponse {
                capability: capability.to_string(),
                message: e.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ExtractRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ExtractResponse {
    job_title: String,
    #[serde(default)]
    compensation: Option<String>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    skills: Vec<String>,
    company_name: String,
}

#[derive(Serialize)]
struct ContactRequest<'a> {
    organization: &'a str,
    hint: &'a str,
}

#[derive(Deserialize)]
struct ContactResponse {
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    profile_url: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Serialize)]
struct DraftWireRequest<'a> {
    job: &'a JobFacts,
    contact: &'a Contact,
    brief: &'a str,
}

#[derive(Deserialize)]
struct DraftResponse {
    subject: String,
    body: String,
    #[serde(default)]
    call_to_action: String,
}

#[derive(Serialize)]
struct DispatchRequest<'a> {
    recipient: &'a str,
    subject: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct DispatchResponse {
    success: bool,
    message: String,
}

// ---------------------------------------------------------------------------
// CapabilityProvider impl
// ---------------------------------------------------------------------------

impl CapabilityProvider for HttpCapabilities {
    async fn extract_facts(&self, source_url: &str) -> Result<JobFacts, CapabilityError> {
        let url = format!("{}/extract", self.endpoints.extract);
        let resp: ExtractResponse = self
            .post("extract", &url, &ExtractRequest { url: source_url })
            .await?;

        Ok(JobFacts {
            title: resp.job_title,
            compensation: resp.compensation,
            duration: resp.duration,
            skills: resp.skills,
            organization: resp.company_name,
        })
    }

    async fn find_contact(
        &self,
        organization: &str,
        hint: &str,
    ) -> Result<Contact, CapabilityError> {
        let url = format!("{}/contacts/search", self.endpoints.contact);
        let resp: ContactResponse = self
            .post("find_contact", &url, &ContactRequest { organization, hint })
            .await?;

        Ok(Contact {
            name: resp.name,
            email: resp.email,
            profile_url: resp.profile_url,
            title: resp.title,
        })
    }

    async fn generate_draft(
        &self,
        request: DraftRequest<'_>,
    ) -> Result<String, CapabilityError> {
        let url = format!("{}/draft", self.endpoints.draft);
        let resp: DraftResponse = self
            .post(
                "generate_draft",
                &url,
                &DraftWireRequest {
                    job: request.facts,
                    contact: request.contact,
                    brief: request.brief,
                },
            )
            .await?;

        Ok(compose_draft(
            &resp.subject,
            &request.contact.name,
            &resp.body,
            &resp.call_to_action,
        ))
    }

    async fn dispatch(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<DispatchReceipt, CapabilityError> {
        let url = format!("{}/send", self.endpoints.dispatch);
        let resp: DispatchResponse = self
            .post(
                "dispatch",
                &url,
                &DispatchRequest {
                    recipient,
                    subject,
                    body,
                },
            )
            .await?;

        Ok(DispatchReceipt {
            success: resp.success,
            message: resp.message,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn caps_for(server: &MockServer) -> HttpCapabilities {
        let uri = server.uri();
        HttpCapabilities::new(HttpEndpoints {
            extract: uri.clone(),
            contact: uri.clone(),
            draft: uri.clone(),
            dispatch: uri,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_extract_maps_wire_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract"))
            .and(body_partial_json(json!({"url": "https://jobs.example/1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "job_title": "Backend Engineer",
                "compensation": "$150k",
                "skills": ["Rust"],
                "company_name": "Acme Robotics"
            })))
            .mount(&server)
            .await;

        let caps = caps_for(&server);
        let facts = caps.extract_facts("https://jobs.example/1").await.unwrap();
        assert_eq!(facts.title, "Backend Engineer");
        assert_eq!(facts.organization, "Acme Robotics");
        assert!(facts.duration.is_none());
    }

    #[tokio::test]
    async fn test_find_contact_tolerates_missing_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contacts/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Jane Doe"
            })))
            .mount(&server)
            .await;

        let caps = caps_for(&server);
        let contact = caps.find_contact("Acme", "cto").await.unwrap();
        assert_eq!(contact.name, "Jane Doe");
        assert!(contact.email.is_none());
    }

    #[tokio::test]
    async fn test_generate_draft_composes_canonical_layout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/draft"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subject": "Hello Acme",
                "body": "The body.",
                "call_to_action": "Call me."
            })))
            .mount(&server)
            .await;

        let caps = caps_for(&server);
        let facts = JobFacts {
            title: "Backend Engineer".to_string(),
            compensation: None,
            duration: None,
            skills: vec![],
            organization: "Acme".to_string(),
        };
        let contact = Contact {
            name: "Jane Doe".to_string(),
            email: None,
            profile_url: None,
            title: None,
        };
        let draft = caps
            .generate_draft(DraftRequest {
                facts: &facts,
                contact: &contact,
                brief: "brief",
            })
            .await
            .unwrap();
        assert!(draft.starts_with("Subject: Hello Acme\n\nDear Jane Doe,\n\n"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let caps = caps_for(&server);
        let err = caps.dispatch("x@y.example", "s", "b").await.unwrap_err();
        let CapabilityError::Rejected { message, .. } = err else {
            panic!("expected Rejected, got {err:?}");
        };
        assert!(message.contains("503"));
        assert!(message.contains("overloaded"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let caps = caps_for(&server);
        let err = caps.dispatch("x@y.example", "s", "b").await.unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        // Port 1 is never listening.
        let caps = HttpCapabilities::new(HttpEndpoints {
            extract: "http://127.0.0.1:1".to_string(),
            contact: "http://127.0.0.1:1".to_string(),
            draft: "http://127.0.0.1:1".to_string(),
            dispatch: "http://127.0.0.1:1".to_string(),
        })
        .unwrap();

        let err = caps.extract_facts("url").await.unwrap_err();
        assert!(matches!(err, CapabilityError::Unavailable { .. }));
    }
}
