//! Gemini `generateContent` back-end.
//!
//! The request is raced against a timer rather than relying on a client-level
//! timeout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

use super::gateway::{
    CallOptions, LlmBackend, http_client, normalize_base_url, race_timeout, status_error,
    transport_error,
};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
}

impl GeminiBackend {
    pub fn new() -> Result<Self, GatewayError> {
        Self::with_base_url(DEFAULT_GEMINI_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, GatewayError> {
        Ok(Self {
            client: http_client()?,
            base_url: normalize_base_url(base_url),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    async fn send(&self, prompt: &str, options: &CallOptions) -> Result<Option<String>, GatewayError> {
        let response = self
            .client
            .post(self.endpoint(&options.model))
            .header("x-goog-api-key", &options.api_key)
            .json(&build_request(prompt, options))
            .send()
            .await
            .map_err(|e| transport_error(e, options.timeout))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, options.timeout))?;

        Ok(body.text())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate, if any.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

fn build_request<'a>(prompt: &'a str, options: &'a CallOptions) -> GenerateRequest<'a> {
    let system_instruction = (!options.system_instruction.is_empty()).then(|| Content {
        role: None,
        parts: vec![Part {
            text: &options.system_instruction,
        }],
    });

    GenerateRequest {
        system_instruction,
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part { text: prompt }],
        }],
        generation_config: GenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_output_tokens,
        },
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn complete(
        &self,
        prompt: &str,
        options: &CallOptions,
    ) -> Result<Option<String>, GatewayError> {
        race_timeout(options.timeout, self.send(prompt, options)).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_endpoint_includes_model() {
        let backend = GeminiBackend::with_base_url("http://localhost:9000/").unwrap();
        assert_eq!(
            backend.endpoint("gemini-1.5-pro"),
            "http://localhost:9000/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let options = CallOptions::new("k", "gemini-1.5-pro", Duration::from_secs(10))
            .with_system_instruction("be brief")
            .with_max_output_tokens(2000);
        let body = serde_json::to_value(build_request("hello", &options)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2000);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"is_significant\":"},{"text":"false}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.text().as_deref(), Some("{\"is_significant\":false}"));
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let body: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(body.text().is_none());

        let body: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(body.text().is_none());
    }
}
