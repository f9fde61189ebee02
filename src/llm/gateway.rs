//! Uniform completion capability over the supported LLM back-ends.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::{Config, Provider};
use crate::error::GatewayError;

use super::gemini::GeminiBackend;
use super::openai::OpenAiBackend;

/// Sampling temperature for every request.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Output budget for significance analysis (a short JSON object).
pub const ANALYSIS_MAX_OUTPUT_TOKENS: u32 = 500;

/// Output budget for ADR drafting (a full MADR document).
pub const GENERATION_MAX_OUTPUT_TOKENS: u32 = 2000;

/// Longest error body kept verbatim when a provider returns non-JSON.
const MAX_RAW_ERROR_CHARS: usize = 300;

/// Per-call request settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOptions {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub system_instruction: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl CallOptions {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            timeout,
            system_instruction: String::new(),
            max_output_tokens: ANALYSIS_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }
}

/// One LLM back-end.
///
/// Implementations issue exactly one request per call and honour
/// `options.timeout`. `Ok(None)` means the provider answered successfully
/// with no text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        options: &CallOptions,
    ) -> Result<Option<String>, GatewayError>;
}

/// The configured back-end, chosen from a closed set of providers.
#[derive(Debug, Clone)]
pub enum ProviderGateway {
    OpenAi(OpenAiBackend),
    Gemini(GeminiBackend),
}

impl ProviderGateway {
    /// Build the back-end for `provider`, optionally against a custom endpoint.
    pub fn new(provider: Provider, base_url: Option<&str>) -> Result<Self, GatewayError> {
        let gateway = match provider {
            Provider::OpenAi => ProviderGateway::OpenAi(match base_url {
                Some(url) => OpenAiBackend::with_base_url(url)?,
                None => OpenAiBackend::new()?,
            }),
            Provider::Gemini => ProviderGateway::Gemini(match base_url {
                Some(url) => GeminiBackend::with_base_url(url)?,
                None => GeminiBackend::new()?,
            }),
        };
        Ok(gateway)
    }

    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        Self::new(config.provider, config.base_url.as_deref())
    }

    pub fn provider(&self) -> Provider {
        match self {
            ProviderGateway::OpenAi(_) => Provider::OpenAi,
            ProviderGateway::Gemini(_) => Provider::Gemini,
        }
    }
}

#[async_trait]
impl LlmBackend for ProviderGateway {
    async fn complete(
        &self,
        prompt: &str,
        options: &CallOptions,
    ) -> Result<Option<String>, GatewayError> {
        debug!(
            provider = self.provider().as_str(),
            model = %options.model,
            prompt_chars = prompt.len(),
            timeout_ms = options.timeout.as_millis() as u64,
            "Dispatching completion request"
        );
        match self {
            ProviderGateway::OpenAi(backend) => backend.complete(prompt, options).await,
            ProviderGateway::Gemini(backend) => backend.complete(prompt, options).await,
        }
    }
}

/// Race `request` against a timer, reporting a timeout if the timer wins.
///
/// The losing request future is dropped, which abandons the in-flight call.
pub async fn race_timeout<T, F>(limit: Duration, request: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    tokio::time::timeout(limit, request)
        .await
        .map_err(|_| GatewayError::Timeout(limit.as_millis() as u64))?
}

/// Map a transport-level `reqwest` failure onto a gateway error.
pub(crate) fn transport_error(err: reqwest::Error, limit: Duration) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(limit.as_millis() as u64)
    } else if err.is_connect() {
        GatewayError::Connect(err.to_string())
    } else if err.is_decode() {
        GatewayError::Decode(err.to_string())
    } else {
        GatewayError::Transport(err.to_string())
    }
}

/// Read a non-success response into a status error.
pub(crate) async fn status_error(response: reqwest::Response) -> GatewayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let mut err = parse_error_body(status.as_u16(), &body);
    if let GatewayError::Status { message, .. } = &mut err
        && message.is_empty()
    {
        *message = status.canonical_reason().unwrap_or("Unknown error").to_string();
    }
    err
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    status: Option<String>,
}

/// Decode `{"error": {...}}` bodies from either provider.
///
/// OpenAI puts a string discriminator in `code`; Gemini puts the numeric HTTP
/// code there and the discriminator in `status`.
pub fn parse_error_body(status: u16, body: &str) -> GatewayError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let code = match envelope.error.code {
                Some(serde_json::Value::String(code)) => Some(code),
                _ => envelope.error.status,
            };
            GatewayError::Status {
                status,
                code,
                message: envelope.error.message.unwrap_or_default(),
            }
        }
        Err(_) => GatewayError::Status {
            status,
            code: None,
            message: body.trim().chars().take(MAX_RAW_ERROR_CHARS).collect(),
        },
    }
}

/// Drop a trailing slash so endpoint paths join cleanly.
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

pub(crate) fn http_client() -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .user_agent(concat!("cadr/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| GatewayError::Transport(format!("Failed to create HTTP client: {}", e)))
}
