//! Error types for cadr modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the version-control layer.
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Not in a Git repository. Please run 'cadr' from within a Git repository.")]
    NotARepository,

    #[error("Git is not installed. Please install Git and try again.")]
    ToolNotFound,

    #[error("{0}")]
    OperationFailed(String),
}

/// Errors from loading `cadr.yaml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Configuration is invalid:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),
}

/// Errors from the interactive `cadr init` setup.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Setup prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Raw failure from a provider back-end, before classification.
///
/// Carries the HTTP status or transport discriminator so callers can decide
/// what kind of failure it was.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unreadable response body: {0}")]
    Decode(String),
}

/// Classified provider failures, each with a user-facing message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("API key not found in environment variable {env_var}. Set it with: export {env_var}=\"your-api-key\"")]
    MissingKey { env_var: String },

    #[error("Authentication failed: {provider} rejected the API key. Check that it is valid and active.")]
    AuthFailed { provider: String },

    #[error("Rate limit exceeded for {provider}. Wait a moment and try again.")]
    RateLimited { provider: String },

    #[error(
        "The changes are too large for the model's context window (~{estimated_tokens} tokens).\n\n\
             Try one of:\n  \
             cadr analyze --staged          (analyze only staged files)\n  \
             add ignore_patterns to cadr.yaml (skip lockfiles, generated code)\n  \
             switch to a model with a larger context window"
    )]
    ContextTooLarge { estimated_tokens: usize },

    #[error("Request timed out after {seconds}s. Increase timeout_seconds in cadr.yaml if this keeps happening.")]
    Timeout { seconds: u64 },

    #[error("Unable to reach {provider}. Check your network connection.")]
    NetworkUnreachable { provider: String },

    #[error("{provider} API error: {message}")]
    Unclassified { provider: String, message: String },
}

/// Problems with the content a provider returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResponseError {
    #[error("No response content from LLM")]
    Empty,

    #[error("Failed to parse LLM response as JSON: {detail}. Response: {excerpt}")]
    Malformed { detail: String, excerpt: String },

    #[error("Invalid response format from LLM: {0}")]
    SchemaInvalid(String),

    #[error("LLM marked the change as significant but gave no reason")]
    MissingReason,
}

/// What an analysis or generation engine reports instead of a result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Response(#[from] ResponseError),
}

/// Errors from writing ADR files.
#[derive(Error, Debug)]
pub enum FileSystemError {
    #[error("Permission denied writing to {}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Other {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FileSystemError {
    /// Sort an I/O failure into the permission bucket or the catch-all.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => FileSystemError::PermissionDenied { path, source },
            _ => FileSystemError::Other { path, source },
        }
    }
}
