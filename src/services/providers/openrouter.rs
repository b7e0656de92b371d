//! OpenRouter completion provider.
//!
//! Implements text generation against the OpenAI-compatible chat
//! completions endpoint. Single-shot requests only; the caller is
//! expected to retry on rate limits.

use super::{GenerationParams, ProviderError, ProviderResponse, TextProvider};
use crate::models::Usage;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// OpenRouter provider configuration.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: String,
    pub base_url: String,
    pub http_referer: Option<String>,
    pub system_prompt: Option<String>,
    pub timeout_secs: u64,
}

/// OpenRouter text provider.
pub struct OpenRouterTextProvider {
    config: OpenRouterConfig,
    client: Client,
}

impl OpenRouterTextProvider {
    pub fn new(config: OpenRouterConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client build failed: {}", e)))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_messages(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.config.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });
        messages
    }
}

#[async_trait]
impl TextProvider for OpenRouterTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let request = ChatCompletionRequest {
            model: params.model.clone(),
            messages: self.build_messages(prompt),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        tracing::debug!(
            model = %params.model,
            prompt_len = prompt.len(),
            max_tokens = params.max_tokens,
            "Sending request to OpenRouter API"
        );

        let mut outbound = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request);

        if let Some(referer) = &self.config.http_referer {
            outbound = outbound.header("HTTP-Referer", referer);
        }

        let response = outbound.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout("OpenRouter API request timed out".to_string())
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body)
                .unwrap_or_else(|| format!("OpenRouter API error {}: {}", status, body));

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderError::AuthFailed(message)
                }
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    ProviderError::InvalidRequest(message)
                }
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(message),
                _ => ProviderError::Api(message),
            });
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(format!("Failed to parse response: {}", e)))?;

        let content = api_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| ProviderError::Api("Response contained no choices".to_string()))?;

        let usage = api_response.usage.unwrap_or_default();
        let model = api_response.model.unwrap_or_else(|| params.model.clone());

        Ok(ProviderResponse {
            content,
            model,
            usage: Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "OpenRouter API key not configured".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pull the human-readable message out of an OpenAI-style error body.
fn extract_error_message(body: &str) -> Option<String> {
    let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
    Some(parsed.error.message)
}

// ============================================================================
// OpenRouter API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageBody>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize, Default)]
struct UsageBody {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_completion_response() {
        let body = r#"{
            "id": "gen-123",
            "model": "mistralai/mistral-7b-instruct",
            "choices": [
                {"message": {"role": "assistant", "content": "Hello there"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
        }"#;

        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Hello there");
        let usage = parsed.usage.unwrap();
        assert_eq!(usage.total_tokens, usage.prompt_tokens + usage.completion_tokens);
    }

    #[test]
    fn parses_response_without_usage() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "ok"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.usage.is_none());
        assert!(parsed.model.is_none());
    }

    #[test]
    fn extracts_openai_style_error_message() {
        let body = r#"{"error": {"message": "Invalid model id", "type": "invalid_request_error", "code": 400}}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Invalid model id")
        );
    }

    #[test]
    fn falls_back_on_unstructured_error_body() {
        assert!(extract_error_message("upstream down").is_none());
    }

    #[test]
    fn system_prompt_is_prepended() {
        let provider = OpenRouterTextProvider::new(OpenRouterConfig {
            api_key: "test-key".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            http_referer: None,
            system_prompt: Some("You are a helpful assistant.".to_string()),
            timeout_secs: 60,
        })
        .unwrap();

        let messages = provider.build_messages("hello");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "hello");
    }

    #[tokio::test]
    async fn health_check_fails_without_api_key() {
        let provider = OpenRouterTextProvider::new(OpenRouterConfig {
            api_key: String::new(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            http_referer: None,
            system_prompt: None,
            timeout_secs: 60,
        })
        .unwrap();

        assert!(matches!(
            provider.health_check().await,
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn completions_url_handles_trailing_slash() {
        let provider = OpenRouterTextProvider::new(OpenRouterConfig {
            api_key: "test-key".to_string(),
            base_url: "https://openrouter.ai/api/v1/".to_string(),
            http_referer: None,
            system_prompt: None,
            timeout_secs: 60,
        })
        .unwrap();

        assert_eq!(
            provider.completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }
}
