//! Request and result types shared by the analysis and generation engines.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::EngineError;
use crate::git::ChangeSet;

/// Title used when a generated document has no `# ` heading.
pub const UNTITLED_DECISION: &str = "Untitled Decision";

/// The change set an engine is asked about.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub file_paths: &'a [String],
    pub diff_text: &'a str,
}

impl<'a> From<&'a ChangeSet> for AnalysisRequest<'a> {
    fn from(changes: &'a ChangeSet) -> Self {
        Self {
            file_paths: &changes.file_paths,
            diff_text: &changes.diff_text,
        }
    }
}

/// Validated significance verdict.
///
/// `reason` is non-empty whenever `is_significant` is true.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub is_significant: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// When the verdict was received, not when the model claims it was made.
    pub timestamp: DateTime<Utc>,
}

/// A drafted ADR body and its title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub content: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
}

pub type AnalysisResponse = Result<AnalysisResult, EngineError>;

pub type GenerationResponse = Result<GenerationResult, EngineError>;
