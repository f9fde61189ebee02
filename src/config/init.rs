//! Interactive first-run setup for `cadr.yaml`.

use std::io::Write;
use std::path::Path;

use dialoguer::{Input, Select};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::InitError;

use super::file::{Config, Provider, RawConfig, validate};

const DEFAULT_TIMEOUT_SECS: i64 = 15;
const DEFAULT_IGNORE_PATTERNS: &str = "*.md,package-lock.json,Cargo.lock";

/// Result of running `cadr init`.
#[derive(Debug)]
pub enum InitOutcome {
    /// A configuration file was already present and left untouched.
    AlreadyExists,
    Created(Config),
}

/// Prompt for configuration values and write them to `path`.
///
/// Never overwrites an existing file.
pub fn run_init(path: &Path) -> Result<InitOutcome, InitError> {
    if path.exists() {
        return Ok(InitOutcome::AlreadyExists);
    }

    println!("\ncADR configuration setup\n");

    let names: Vec<&str> = Provider::ALL.iter().map(|p| p.display_name()).collect();
    let choice = Select::new()
        .with_prompt("LLM provider")
        .items(&names)
        .default(0)
        .interact()?;
    let provider = Provider::ALL[choice];

    let analysis_model: String = Input::new()
        .with_prompt("Analysis model")
        .default(provider.default_model().to_string())
        .interact_text()?;

    let api_key_env: String = Input::new()
        .with_prompt("API key environment variable")
        .default(provider.default_key_env().to_string())
        .interact_text()?;

    let timeout_seconds: i64 = Input::new()
        .with_prompt("Timeout (seconds, 1-60)")
        .default(DEFAULT_TIMEOUT_SECS)
        .interact_text()?;

    let ignore_input: String = Input::new()
        .with_prompt("Ignore patterns (comma-separated, optional)")
        .default(DEFAULT_IGNORE_PATTERNS.to_string())
        .allow_empty(true)
        .interact_text()?;

    let config = validate(RawConfig {
        provider: Some(provider.as_str().to_string()),
        analysis_model: Some(analysis_model),
        api_key_env: Some(api_key_env),
        timeout_seconds: Some(timeout_seconds),
        ignore_patterns: Some(split_patterns(&ignore_input)),
        base_url: None,
        adr_directory: None,
    })?;

    write_new_config(path, &config)?;
    info!(config_path = %path.display(), "Configuration file created");

    Ok(InitOutcome::Created(config))
}

/// Serialize `config` to `path`, failing if the file appeared meanwhile.
pub fn write_new_config(path: &Path, config: &Config) -> Result<(), InitError> {
    let write_err = |source| InitError::Write {
        path: path.to_path_buf(),
        source,
    };

    let yaml = serde_yaml::to_string(config)
        .map_err(|e| write_err(std::io::Error::other(e)))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(yaml.as_bytes()).map_err(write_err)?;
    tmp.persist_noclobber(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn split_patterns(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
