//! ADR drafting: the model's Markdown is taken as the document body.

use std::sync::LazyLock;
use std::time::Instant;

use chrono::Utc;
use regex_lite::Regex;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ResponseError;
use crate::llm::prompt::GENERATION_SYSTEM_INSTRUCTION;
use crate::llm::{
    CallOptions, GENERATION_MAX_OUTPUT_TOKENS, LlmBackend, format_generation, strip_code_fence,
};

use super::engine::{complete_text, estimate_tokens, require_api_key};
use super::types::{AnalysisRequest, GenerationResponse, GenerationResult, UNTITLED_DECISION};

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").expect("Invalid regex"));

/// Draft an ADR for a change set.
pub async fn generate<B>(
    config: &Config,
    request: AnalysisRequest<'_>,
    backend: &B,
) -> GenerationResponse
where
    B: LlmBackend + ?Sized,
{
    let api_key = require_api_key(config)?;

    let prompt = format_generation(request.file_paths, request.diff_text);
    let estimated_tokens = estimate_tokens(&prompt);

    let options = CallOptions::new(api_key, &config.analysis_model, config.timeout())
        .with_system_instruction(GENERATION_SYSTEM_INSTRUCTION)
        .with_max_output_tokens(GENERATION_MAX_OUTPUT_TOKENS);

    info!(
        provider = config.provider.as_str(),
        model = %config.analysis_model,
        estimated_tokens,
        "Generating ADR"
    );
    let started = Instant::now();

    let text = complete_text(config, backend, &prompt, &options, estimated_tokens).await?;

    let content = strip_code_fence(&text).to_string();
    if content.is_empty() {
        warn!("Generated ADR was empty after removing code fences");
        return Err(ResponseError::Empty.into());
    }
    let title = extract_title(&content);

    info!(
        title = %title,
        content_chars = content.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "ADR generated"
    );

    Ok(GenerationResult {
        content,
        title,
        timestamp: Utc::now(),
    })
}

/// Text of the first level-one Markdown heading, or the untitled default.
pub fn extract_title(content: &str) -> String {
    HEADING_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNTITLED_DECISION.to_string())
}
