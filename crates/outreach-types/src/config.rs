//! Global configuration types for Outreach.
//!
//! `OutreachConfig` represents the top-level `config.toml` that controls
//! which capability backend runs stages and the default content brief.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Outreach pipeline.
///
/// Loaded from `~/.outreach/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachConfig {
    /// Content brief used when a run does not supply its own.
    #[serde(default = "default_brief")]
    pub default_brief: String,

    /// Which backend executes the capability calls.
    #[serde(default)]
    pub capabilities: CapabilityConfig,
}

fn default_brief() -> String {
    "Our product is an AI-powered coding assistant that helps developers write better code faster."
        .to_string()
}

impl Default for OutreachConfig {
    fn default() -> Self {
        Self {
            default_brief: default_brief(),
            capabilities: CapabilityConfig::default(),
        }
    }
}

/// Capability backend selection and HTTP endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityConfig {
    /// Backend mode; fixture mode needs no network.
    #[serde(default)]
    pub mode: CapabilityMode,
    /// Base URL of the extraction service (HTTP mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_endpoint: Option<String>,
    /// Base URL of the contact lookup service (HTTP mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_endpoint: Option<String>,
    /// Base URL of the drafting service (HTTP mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_endpoint: Option<String>,
    /// Base URL of the email dispatch service (HTTP mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_endpoint: Option<String>,
}

/// Which implementation backs the capability calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityMode {
    /// Deterministic in-process fixtures; the default.
    #[default]
    Fixture,
    /// Remote HTTP services named by the `*_endpoint` fields.
    Http,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = OutreachConfig::default();
        assert!(config.default_brief.contains("coding assistant"));
        assert_eq!(config.capabilities.mode, CapabilityMode::Fixture);
        assert!(config.capabilities.extract_endpoint.is_none());
    }

    #[test]
    fn test_config_deserialize_empty_uses_defaults() {
        let config: OutreachConfig = toml::from_str("").unwrap();
        assert_eq!(config.capabilities.mode, CapabilityMode::Fixture);
        assert!(config.default_brief.contains("coding assistant"));
    }

    #[test]
    fn test_config_deserialize_with_values() {
        let toml_str = r#"
default_brief = "We sell rugged keyboards."

[capabilities]
mode = "http"
extract_endpoint = "http://localhost:9001"
dispatch_endpoint = "http://localhost:9004"
"#;
        let config: OutreachConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_brief, "We sell rugged keyboards.");
        assert_eq!(config.capabilities.mode, CapabilityMode::Http);
        assert_eq!(
            config.capabilities.extract_endpoint.as_deref(),
            Some("http://localhost:9001")
        );
        assert!(config.capabilities.contact_endpoint.is_none());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = OutreachConfig {
            default_brief: "brief".to_string(),
            capabilities: CapabilityConfig {
                mode: CapabilityMode::Http,
                extract_endpoint: Some("http://x".to_string()),
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: OutreachConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.default_brief, "brief");
        assert_eq!(parsed.capabilities.mode, CapabilityMode::Http);
        assert_eq!(parsed.capabilities.extract_endpoint.as_deref(), Some("http://x"));
    }
}
