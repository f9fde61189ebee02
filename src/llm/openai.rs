//! OpenAI-style chat completions back-end.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

use super::gateway::{
    CallOptions, LlmBackend, http_client, normalize_base_url, status_error, transport_error,
};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Client for `POST /v1/chat/completions`.
///
/// Works against any OpenAI-compatible server via [`OpenAiBackend::with_base_url`].
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiBackend {
    pub fn new() -> Result<Self, GatewayError> {
        Self::with_base_url(DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, GatewayError> {
        Ok(Self {
            client: http_client()?,
            base_url: normalize_base_url(base_url),
        })
    }

    fn endpoint(&self) -> String {
        if self.base_url.ends_with("/v1") {
            format!("{}/chat/completions", self.base_url)
        } else {
            format!("{}/v1/chat/completions", self.base_url)
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn build_request<'a>(prompt: &'a str, options: &'a CallOptions) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if !options.system_instruction.is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: &options.system_instruction,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: prompt,
    });

    ChatRequest {
        model: &options.model,
        messages,
        temperature: options.temperature,
        max_tokens: options.max_output_tokens,
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(
        &self,
        prompt: &str,
        options: &CallOptions,
    ) -> Result<Option<String>, GatewayError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&options.api_key)
            .timeout(options.timeout)
            .json(&build_request(prompt, options))
            .send()
            .await
            .map_err(|e| transport_error(e, options.timeout))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, options.timeout))?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|text| !text.trim().is_empty()))
    }
}
