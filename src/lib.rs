//! cadr - detects architecturally significant code changes and drafts
//! Architectural Decision Records for them.
//!
//! # Overview
//!
//! cadr reads a change set from git, asks an LLM whether it is
//! architecturally significant and, once the user agrees, asks the model to
//! draft a MADR-style ADR that is saved as the next numbered file under
//! `docs/adr`. Every failure degrades to a printed message so the command
//! never blocks a commit or a CI job.

pub mod adr;
pub mod analysis;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod logging;
pub mod pipeline;

// Re-export commonly used types
pub use analysis::{AnalysisResponse, AnalysisResult, GenerationResponse, GenerationResult};
pub use config::{Config, Provider};
pub use error::{
    ConfigError, EngineError, FileSystemError, GatewayError, ProviderError, ResponseError,
    VcsError,
};
pub use git::{ChangeSet, ChangeSetMode};
pub use pipeline::{Orchestrator, Outcome};
