//! Configuration file model and validation.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "cadr.yaml";

/// Default ADR directory, relative to the working directory.
pub const DEFAULT_ADR_DIR: &str = "docs/adr";

const MIN_TIMEOUT_SECS: i64 = 1;
const MAX_TIMEOUT_SECS: i64 = 60;

/// Supported LLM back-ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::OpenAi, Provider::Gemini];

    /// Identifier used in `cadr.yaml`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
        }
    }

    /// Human-facing name for messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Gemini => "Gemini",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4",
            Provider::Gemini => "gemini-1.5-pro",
        }
    }

    pub fn default_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Where users create API keys for this provider.
    pub fn key_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://platform.openai.com/api-keys",
            Provider::Gemini => "https://aistudio.google.com/app/apikey",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gemini" => Ok(Provider::Gemini),
            other => Err(format!(
                "provider must be one of \"openai\", \"gemini\" (got \"{}\")",
                other
            )),
        }
    }
}

/// Validated configuration for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub provider: Provider,
    #[serde(alias = "model")]
    pub analysis_model: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_patterns: Vec<String>,
    /// Override for the provider endpoint (proxies, OpenAI-compatible servers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adr_directory: Option<PathBuf>,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn adr_dir(&self) -> PathBuf {
        self.adr_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ADR_DIR))
    }

    /// Read the API key from the configured environment variable.
    ///
    /// An empty value counts as missing.
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.api_key_env).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Configuration as written by the user, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub provider: Option<String>,
    #[serde(alias = "model")]
    pub analysis_model: Option<String>,
    pub api_key_env: Option<String>,
    pub timeout_seconds: Option<i64>,
    pub ignore_patterns: Option<Vec<String>>,
    pub base_url: Option<String>,
    pub adr_directory: Option<PathBuf>,
}

/// Validate a raw configuration, collecting every problem found.
pub fn validate(raw: RawConfig) -> Result<Config, ConfigError> {
    let mut errors = Vec::new();

    let provider = match raw.provider.as_deref() {
        None => {
            errors.push("provider is required".to_string());
            None
        }
        Some(name) => match name.parse::<Provider>() {
            Ok(p) => Some(p),
            Err(e) => {
                errors.push(e);
                None
            }
        },
    };

    let analysis_model = non_blank(raw.analysis_model);
    if analysis_model.is_none() {
        errors.push("analysis_model is required".to_string());
    }

    let api_key_env = non_blank(raw.api_key_env);
    if api_key_env.is_none() {
        errors.push("api_key_env (API key environment variable name) is required".to_string());
    }

    let timeout_seconds = match raw.timeout_seconds {
        None => {
            errors.push("timeout_seconds is required".to_string());
            None
        }
        Some(t) if t < MIN_TIMEOUT_SECS => {
            errors.push(format!(
                "timeout_seconds must be at least {} second",
                MIN_TIMEOUT_SECS
            ));
            None
        }
        Some(t) if t > MAX_TIMEOUT_SECS => {
            errors.push(format!(
                "timeout_seconds must not exceed {} seconds",
                MAX_TIMEOUT_SECS
            ));
            None
        }
        Some(t) => Some(t as u64),
    };

    match (provider, analysis_model, api_key_env, timeout_seconds) {
        (Some(provider), Some(analysis_model), Some(api_key_env), Some(timeout_seconds))
            if errors.is_empty() =>
        {
            Ok(Config {
                provider,
                analysis_model,
                api_key_env,
                timeout_seconds,
                ignore_patterns: raw
                    .ignore_patterns
                    .unwrap_or_default()
                    .into_iter()
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect(),
                base_url: non_blank(raw.base_url),
                adr_directory: raw.adr_directory,
            })
        }
        _ => Err(ConfigError::Invalid(errors)),
    }
}

/// Load and validate a configuration file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        warn!(config_path = %path.display(), "Configuration file not found");
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Invalid(vec![format!("could not read {}: {}", path.display(), e)])
    })?;

    let raw: RawConfig = serde_yaml::from_str(&content).map_err(|e| {
        warn!(config_path = %path.display(), error = %e, "Invalid YAML configuration");
        ConfigError::Invalid(vec![format!("invalid YAML: {}", e)])
    })?;

    let config = validate(raw).inspect_err(|e| {
        warn!(config_path = %path.display(), error = %e, "Configuration validation failed");
    })?;

    if config.api_key().is_none() {
        warn!(
            api_key_env = %config.api_key_env,
            "API key environment variable is not set"
        );
    }

    info!(
        config_path = %path.display(),
        provider = config.provider.as_str(),
        "Configuration loaded"
    );
    Ok(config)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(yaml: &str) -> RawConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_validate_minimal_config() {
        let config = validate(raw(
            "provider: openai\nanalysis_model: gpt-4\napi_key_env: OPENAI_API_KEY\ntimeout_seconds: 15\n",
        ))
        .unwrap();

        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.analysis_model, "gpt-4");
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert!(config.ignore_patterns.is_empty());
        assert_eq!(config.adr_dir(), PathBuf::from("docs/adr"));
    }

    #[test]
    fn test_validate_accepts_model_alias() {
        let config = validate(raw(
            "provider: gemini\nmodel: gemini-1.5-pro\napi_key_env: GEMINI_API_KEY\ntimeout_seconds: 60\nignore_patterns: ['*.lock', '  ']\n",
        ))
        .unwrap();

        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.analysis_model, "gemini-1.5-pro");
        assert_eq!(config.ignore_patterns, vec!["*.lock".to_string()]);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let err = validate(raw("provider: anthropic\ntimeout_seconds: 0\n")).unwrap_err();
        match err {
            ConfigError::Invalid(errors) => {
                assert_eq!(errors.len(), 4);
                assert!(errors[0].contains("anthropic"));
                assert!(errors.iter().any(|e| e.contains("analysis_model")));
                assert!(errors.iter().any(|e| e.contains("api_key_env")));
                assert!(errors.iter().any(|e| e.contains("at least 1")));
            }
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_timeout_above_limit() {
        let err = validate(raw(
            "provider: openai\nanalysis_model: gpt-4\napi_key_env: K\ntimeout_seconds: 61\n",
        ))
        .unwrap_err();
        assert!(err.to_string().contains("must not exceed 60"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("cadr.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cadr.yaml");
        std::fs::write(&path, "provider: [unclosed").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_round_trips_written_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cadr.yaml");
        let config = Config {
            provider: Provider::Gemini,
            analysis_model: "gemini-1.5-flash".to_string(),
            api_key_env: "CADR_TEST_UNSET_KEY".to_string(),
            timeout_seconds: 20,
            ignore_patterns: vec!["*.md".to_string()],
            base_url: None,
            adr_directory: Some(PathBuf::from("architecture/decisions")),
        };
        std::fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        assert_eq!(load(&path).unwrap(), config);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert!("claude".parse::<Provider>().is_err());
    }
}
