//! LLM provider gateway, prompt templates and response helpers.

pub mod classify;
pub mod gateway;
pub mod gemini;
pub mod json;
pub mod openai;
pub mod prompt;

pub use classify::classify;
pub use gateway::{
    ANALYSIS_MAX_OUTPUT_TOKENS, CallOptions, DEFAULT_TEMPERATURE, GENERATION_MAX_OUTPUT_TOKENS,
    LlmBackend, ProviderGateway, race_timeout,
};
#[cfg(test)]
pub use gateway::MockLlmBackend;
pub use gemini::GeminiBackend;
pub use json::{excerpt, parse_lenient, strip_code_fence};
pub use openai::OpenAiBackend;
pub use prompt::{format_analysis, format_generation, format_generation_on};
