//! Configuration loader for Outreach.
//!
//! Reads `config.toml` from the data directory (`~/.outreach/` in production)
//! and deserializes it into [`OutreachConfig`]. Falls back to sensible
//! defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use outreach_types::config::OutreachConfig;

/// Resolve the data directory.
///
/// Priority: `OUTREACH_DATA_DIR` env var, then `~/.outreach`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OUTREACH_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".outreach")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`OutreachConfig::default()`]
///   (fixture capabilities, built-in brief).
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> OutreachConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return OutreachConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return OutreachConfig::default();
        }
    };

    match toml::from_str::<OutreachConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            OutreachConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_types::config::CapabilityMode;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.capabilities.mode, CapabilityMode::Fixture);
        assert!(config.default_brief.contains("coding assistant"));
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
default_brief = "We sell rugged keyboards."

[capabilities]
mode = "http"
extract_endpoint = "http://localhost:9001"
contact_endpoint = "http://localhost:9002"
draft_endpoint = "http://localhost:9003"
dispatch_endpoint = "http://localhost:9004"
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.default_brief, "We sell rugged keyboards.");
        assert_eq!(config.capabilities.mode, CapabilityMode::Http);
        assert_eq!(
            config.capabilities.dispatch_endpoint.as_deref(),
            Some("http://localhost:9004")
        );
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.capabilities.mode, CapabilityMode::Fixture);
    }
}
