//! Classify raw gateway failures into user-facing provider errors.

use crate::config::Provider;
use crate::error::{GatewayError, ProviderError};

/// Message fragments providers use when the prompt exceeds the context window.
const CONTEXT_PATTERNS: &[&str] = &[
    "context_length_exceeded",
    "maximum context length",
    "context length",
    "too many tokens",
    "exceeds the maximum number of tokens",
    "input token count",
];

/// Gemini reports a bad key as a 400 with this message.
const INVALID_KEY_PATTERN: &str = "api key not valid";

/// Map a gateway failure onto the provider error taxonomy.
///
/// `estimated_tokens` is the prompt size estimate used in context-length
/// messages; `timeout_secs` is the configured per-call limit.
pub fn classify(
    err: &GatewayError,
    provider: Provider,
    estimated_tokens: usize,
    timeout_secs: u64,
) -> ProviderError {
    let provider_name = provider.display_name().to_string();

    match err {
        GatewayError::Status {
            status,
            code,
            message,
        } => {
            let lower = message.to_lowercase();
            let code_lower = code.as_deref().unwrap_or_default().to_lowercase();

            match *status {
                401 | 403 => ProviderError::AuthFailed {
                    provider: provider_name,
                },
                400 if lower.contains(INVALID_KEY_PATTERN) => ProviderError::AuthFailed {
                    provider: provider_name,
                },
                400 | 413
                    if CONTEXT_PATTERNS
                        .iter()
                        .any(|p| lower.contains(p) || code_lower.contains(p)) =>
                {
                    ProviderError::ContextTooLarge { estimated_tokens }
                }
                429 => ProviderError::RateLimited {
                    provider: provider_name,
                },
                408 | 504 => ProviderError::Timeout {
                    seconds: timeout_secs,
                },
                _ if mentions_timeout(&lower) => ProviderError::Timeout {
                    seconds: timeout_secs,
                },
                _ => ProviderError::Unclassified {
                    provider: provider_name,
                    message: if message.is_empty() {
                        format!("HTTP {}", status)
                    } else {
                        message.clone()
                    },
                },
            }
        }
        GatewayError::Timeout(_) => ProviderError::Timeout {
            seconds: timeout_secs,
        },
        GatewayError::Connect(_) => ProviderError::NetworkUnreachable {
            provider: provider_name,
        },
        GatewayError::Transport(message) | GatewayError::Decode(message) => {
            if mentions_timeout(&message.to_lowercase()) {
                ProviderError::Timeout {
                    seconds: timeout_secs,
                }
            } else {
                ProviderError::Unclassified {
                    provider: provider_name,
                    message: message.clone(),
                }
            }
        }
    }
}

fn mentions_timeout(lower: &str) -> bool {
    lower.contains("timeout") || lower.contains("timed out")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16, code: Option<&str>, message: &str) -> GatewayError {
        GatewayError::Status {
            status,
            code: code.map(str::to_string),
            message: message.to_string(),
        }
    }

    fn classify_openai(err: &GatewayError) -> ProviderError {
        classify(err, Provider::OpenAi, 12_000, 15)
    }

    #[test]
    fn test_auth_statuses() {
        for code in [401, 403] {
            assert_eq!(
                classify_openai(&status(code, None, "nope")),
                ProviderError::AuthFailed {
                    provider: "OpenAI".to_string()
                }
            );
        }
    }

    #[test]
    fn test_gemini_invalid_key_is_auth_failure() {
        let err = status(400, Some("INVALID_ARGUMENT"), "API key not valid. Please pass a valid API key.");
        assert!(matches!(
            classify(&err, Provider::Gemini, 10, 15),
            ProviderError::AuthFailed { .. }
        ));
    }

    #[test]
    fn test_context_length_by_message_or_code() {
        let by_message = status(400, None, "This model's maximum context length is 8192 tokens.");
        assert_eq!(
            classify_openai(&by_message),
            ProviderError::ContextTooLarge {
                estimated_tokens: 12_000
            }
        );

        let by_code = status(400, Some("context_length_exceeded"), "Request rejected");
        assert!(matches!(
            classify_openai(&by_code),
            ProviderError::ContextTooLarge { .. }
        ));
    }

    #[test]
    fn test_plain_bad_request_is_unclassified() {
        let err = status(400, None, "Unsupported parameter: temperature");
        match classify_openai(&err) {
            ProviderError::Unclassified { message, .. } => {
                assert_eq!(message, "Unsupported parameter: temperature")
            }
            other => panic!("Expected Unclassified, got {:?}", other),
        }
    }

    #[test]
    fn test_rate_limit() {
        assert!(matches!(
            classify_openai(&status(429, None, "slow down")),
            ProviderError::RateLimited { .. }
        ));
    }

    #[test]
    fn test_timeouts() {
        assert_eq!(
            classify_openai(&GatewayError::Timeout(15_000)),
            ProviderError::Timeout { seconds: 15 }
        );
        assert!(matches!(
            classify_openai(&GatewayError::Transport("operation timed out".to_string())),
            ProviderError::Timeout { .. }
        ));
        assert!(matches!(
            classify_openai(&status(500, None, "upstream timeout")),
            ProviderError::Timeout { .. }
        ));
    }

    #[test]
    fn test_connect_failure_is_network_unreachable() {
        assert_eq!(
            classify(
                &GatewayError::Connect("dns error".to_string()),
                Provider::Gemini,
                0,
                15
            ),
            ProviderError::NetworkUnreachable {
                provider: "Gemini".to_string()
            }
        );
    }

    #[test]
    fn test_empty_status_message_falls_back_to_code() {
        match classify_openai(&status(500, None, "")) {
            ProviderError::Unclassified { message, .. } => assert_eq!(message, "HTTP 500"),
            other => panic!("Expected Unclassified, got {:?}", other),
        }
    }
}
