//! Significance analysis: one provider call, then strict validation of the
//! JSON verdict.

use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{EngineError, ProviderError, ResponseError};
use crate::llm::prompt::ANALYSIS_SYSTEM_INSTRUCTION;
use crate::llm::{
    ANALYSIS_MAX_OUTPUT_TOKENS, CallOptions, LlmBackend, classify, excerpt, format_analysis,
    parse_lenient,
};

use super::types::{AnalysisRequest, AnalysisResponse, AnalysisResult};

/// Prompts estimated above this many tokens are logged as risky.
pub const LARGE_PROMPT_TOKENS: usize = 100_000;

/// Rough token count: four characters per token.
pub fn estimate_tokens(prompt: &str) -> usize {
    prompt.chars().count().div_ceil(4)
}

/// Ask the model whether a change set is architecturally significant.
pub async fn analyze<B>(config: &Config, request: AnalysisRequest<'_>, backend: &B) -> AnalysisResponse
where
    B: LlmBackend + ?Sized,
{
    let api_key = require_api_key(config)?;

    let prompt = format_analysis(request.file_paths, request.diff_text);
    let estimated_tokens = estimate_tokens(&prompt);
    if estimated_tokens > LARGE_PROMPT_TOKENS {
        warn!(
            estimated_tokens,
            threshold = LARGE_PROMPT_TOKENS,
            "Large prompt may exceed the model's context window"
        );
    }

    let options = CallOptions::new(api_key, &config.analysis_model, config.timeout())
        .with_system_instruction(ANALYSIS_SYSTEM_INSTRUCTION)
        .with_max_output_tokens(ANALYSIS_MAX_OUTPUT_TOKENS);

    info!(
        provider = config.provider.as_str(),
        model = %config.analysis_model,
        file_count = request.file_paths.len(),
        estimated_tokens,
        "Starting significance analysis"
    );
    let started = Instant::now();

    let text = complete_text(config, backend, &prompt, &options, estimated_tokens).await?;
    let result = parse_verdict(&text).inspect_err(|e| {
        warn!(error = %e, "Analysis response rejected");
    })?;

    info!(
        is_significant = result.is_significant,
        confidence = ?result.confidence,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Analysis completed"
    );
    Ok(result)
}

pub(crate) fn require_api_key(config: &Config) -> Result<String, EngineError> {
    config.api_key().ok_or_else(|| {
        warn!(api_key_env = %config.api_key_env, "API key not set; skipping provider call");
        EngineError::from(ProviderError::MissingKey {
            env_var: config.api_key_env.clone(),
        })
    })
}

/// Issue the provider call and turn every failure into an engine error.
pub(crate) async fn complete_text<B>(
    config: &Config,
    backend: &B,
    prompt: &str,
    options: &CallOptions,
    estimated_tokens: usize,
) -> Result<String, EngineError>
where
    B: LlmBackend + ?Sized,
{
    match backend.complete(prompt, options).await {
        Ok(Some(text)) if !text.trim().is_empty() => Ok(text),
        Ok(_) => {
            warn!(provider = config.provider.as_str(), "Provider returned no content");
            Err(ResponseError::Empty.into())
        }
        Err(err) => {
            let classified = classify(&err, config.provider, estimated_tokens, config.timeout_seconds);
            warn!(
                provider = config.provider.as_str(),
                raw_error = %err,
                error = %classified,
                "Provider call failed"
            );
            Err(classified.into())
        }
    }
}

/// Parse and validate the model's JSON verdict.
pub fn parse_verdict(text: &str) -> Result<AnalysisResult, ResponseError> {
    let value = parse_lenient(text).map_err(|detail| ResponseError::Malformed {
        detail,
        excerpt: excerpt(text),
    })?;

    let Some(fields) = value.as_object() else {
        return Err(ResponseError::SchemaInvalid(
            "expected a JSON object".to_string(),
        ));
    };

    let is_significant = fields
        .get("is_significant")
        .and_then(Value::as_bool)
        .ok_or_else(|| ResponseError::SchemaInvalid("is_significant must be a boolean".to_string()))?;

    let reason = fields
        .get("reason")
        .and_then(Value::as_str)
        .ok_or_else(|| ResponseError::SchemaInvalid("reason must be a string".to_string()))?
        .trim()
        .to_string();

    if is_significant && reason.is_empty() {
        return Err(ResponseError::MissingReason);
    }

    // Out-of-range or non-numeric confidence is dropped, not rejected.
    let confidence = fields
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|c| (0.0..=1.0).contains(c));

    Ok(AnalysisResult {
        is_significant,
        reason,
        confidence,
        timestamp: Utc::now(),
    })
}
