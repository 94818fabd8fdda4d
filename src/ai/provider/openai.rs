//! OpenAI API Provider
//!
//! LLM provider using OpenAI's Chat Completions API (or any compatible server).
//! Returns LlmResponse with token usage metrics.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::http::{build_client, parse_error, send_error, status_error, validate_endpoint};
use super::{LlmProvider, LlmResponse, ProviderConfig, ResponseMetadata, ResponseTiming, TokenUsage};
use crate::types::{Result, TierError};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                TierError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY env var or backend.api_key in config"
                        .to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base: validate_endpoint(&api_base, "openai", false)?,
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client: build_client(config.timeout_secs)?,
        })
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str) -> Result<LlmResponse> {
        debug!(
            "Generating with OpenAI (model: {}, temperature: {})",
            self.model, self.temperature
        );

        let start_time = Instant::now();
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| send_error("openai", &self.api_base, e))?;

        if !response.status().is_success() {
            return Err(status_error("openai", response).await);
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| parse_error("openai", e))?;

        let elapsed = start_time.elapsed();

        let usage = body
            .usage
            .map(|u| TokenUsage::from_openai(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| parse_error("openai", "no choices in response"))?;

        Ok(LlmResponse::with_metrics(
            choice.message.content.unwrap_or_default(),
            usage,
            ResponseTiming::from_duration(elapsed),
            ResponseMetadata {
                model: self.model.clone(),
                provider: "openai".to_string(),
            },
        ))
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.api_base);

        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("OpenAI API is available");
                Ok(true)
            }
            Ok(resp) => {
                warn!("OpenAI API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("OpenAI API check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::ComplexityTier;

    fn provider_config() -> ProviderConfig {
        let mut config = ProviderConfig::for_tier(&Config::default(), ComplexityTier::Advanced);
        config.provider = "openai".to_string();
        config.model = "gpt-4o-mini".to_string();
        config.api_key = Some("sk-test".to_string());
        config
    }

    #[test]
    fn test_debug_redacts_key() {
        let provider = OpenAiProvider::new(provider_config()).unwrap();
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-test"));
        assert!(debug.contains("gpt-4o-mini"));
    }

    #[test]
    fn test_request_is_plain_chat() {
        let provider = OpenAiProvider::new(provider_config()).unwrap();
        let json = serde_json::to_value(provider.build_request("hello")).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert_eq!(json["max_tokens"], 8192);
    }

    #[test]
    fn test_response_parsing() {
        let body: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"Paris."}}],"usage":{"prompt_tokens":9,"completion_tokens":2}}"#,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("Paris."));
        assert_eq!(body.usage.unwrap().completion_tokens, 2);
    }
}
