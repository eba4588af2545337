use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

// Re-export section config types owned by their modules
pub use crate::ai::AiConfig;
pub use crate::analysis::AnalysisConfig;
pub use crate::nats::NatsConfig;

/// Complete ground-station configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArgusConfig {
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Port the HTTP/WebSocket server binds on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Default page size for GET /api/ai/suggestions/all
    #[serde(default = "default_suggestion_limit")]
    pub default_suggestion_limit: usize,
}

fn default_port() -> u16 {
    8000
}

fn default_suggestion_limit() -> usize {
    50
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            default_suggestion_limit: default_suggestion_limit(),
        }
    }
}

impl ArgusConfig {
    /// Apply environment overrides on top of file/default values.
    ///
    /// - `NATS_URL`: broker URL
    /// - `AI_ENABLED`: "true"/"false"
    /// - `ARGUS_API_PORT`: HTTP port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NATS_URL") {
            self.nats.url = url;
        }
        if let Ok(v) = std::env::var("AI_ENABLED") {
            if let Ok(b) = v.parse::<bool>() {
                self.ai.enabled = b;
            }
        }
        if let Ok(v) = std::env::var("ARGUS_API_PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.api.port = port;
            }
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<ArgusConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: ArgusConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Load configuration from `path` if it exists, defaults otherwise.
///
/// A file that exists but fails to parse is still an error.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ArgusConfig> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using defaults");
        return Ok(ArgusConfig::default());
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ArgusConfig::default();
        assert!(!config.ai.enabled);
        assert_eq!(config.ai.temperature, 0.2);
        assert_eq!(config.ai.max_tokens, 1024);
        assert_eq!(config.ai.default_confidence, 0.7);
        assert_eq!(config.analysis.proximity_interval_seconds, 10);
        assert_eq!(config.analysis.thresholds.low_battery_percent, 25.0);
        assert_eq!(config.api.port, 8000);
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [nats]
            url = "nats://example.com:4222"

            [ai]
            enabled = true
            provider = "openai"
            model = "gpt-4o-mini"
            default_confidence = 0.6

            [analysis]
            proximity_interval_seconds = 5
            alert_cooldown_seconds = 30

            [analysis.thresholds]
            critical_battery_percent = 5.0
            proximity_distance_m = 40.0

            [api]
            port = 9000
        "#;

        let config: ArgusConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.nats.url, "nats://example.com:4222");
        assert!(config.ai.enabled);
        assert_eq!(config.ai.provider, "openai");
        assert_eq!(config.ai.default_confidence, 0.6);
        assert_eq!(config.analysis.proximity_interval_seconds, 5);
        assert_eq!(config.analysis.alert_cooldown_seconds, 30);
        assert_eq!(config.analysis.thresholds.critical_battery_percent, 5.0);
        assert_eq!(config.analysis.thresholds.proximity_distance_m, 40.0);
        assert_eq!(config.api.port, 9000);
    }

    #[test]
    fn test_partial_config() {
        // Missing sections and fields use defaults
        let toml = r#"
            [ai]
            enabled = true
        "#;

        let config: ArgusConfig = toml::from_str(toml).unwrap();
        assert!(config.ai.enabled);
        assert_eq!(config.ai.provider, "anthropic");
        assert_eq!(config.ai.temperature, 0.2);
        assert_eq!(config.analysis.thresholds.weak_signal_percent, 30.0);
        assert_eq!(config.api.default_suggestion_limit, 50);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nport = 8123").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.api.port, 8123);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.api.port, 8000);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nport = ").unwrap();
        assert!(load_or_default(file.path()).is_err());
    }
}
