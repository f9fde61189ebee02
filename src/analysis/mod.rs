//! Significance analysis and ADR generation engines.

pub mod engine;
pub mod generation;
pub mod types;

pub use engine::{LARGE_PROMPT_TOKENS, analyze, estimate_tokens, parse_verdict};
pub use generation::{extract_title, generate};
pub use types::{
    AnalysisRequest, AnalysisResponse, AnalysisResult, GenerationResponse, GenerationResult,
    UNTITLED_DECISION,
};
