//! Ollama Local LLM Provider
//!
//! LLM provider for locally-running Ollama models.
//! Returns LlmResponse with the token counts Ollama reports.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::http::{build_client, parse_error, send_error, status_error, validate_endpoint};
use super::{LlmProvider, LlmResponse, ProviderConfig, ResponseMetadata, ResponseTiming, TokenUsage};
use crate::types::{ErrorCategory, LlmError, Result, TierError};

const DEFAULT_API_BASE: &str = "http://localhost:11434";

/// Ollama Local LLM Provider
pub struct OllamaProvider {
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = validate_endpoint(&api_base, "ollama", true)?;

        Ok(Self {
            api_base,
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client: build_client(config.timeout_secs)?,
        })
    }

    fn build_request<'a>(&'a self, prompt: &'a str) -> OllamaRequest<'a> {
        OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, prompt: &str) -> Result<LlmResponse> {
        debug!(
            "Generating with Ollama (model: {}, temperature: {})",
            self.model, self.temperature
        );

        let start_time = Instant::now();
        let url = format!("{}/api/generate", self.api_base);

        let response = self
            .client
            .post(&url)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    TierError::Llm(LlmError::with_provider(
                        ErrorCategory::Network,
                        format!(
                            "Failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve",
                            self.api_base
                        ),
                        "ollama",
                    ))
                } else {
                    send_error("ollama", &self.api_base, e)
                }
            })?;

        if !response.status().is_success() {
            return Err(status_error("ollama", response).await);
        }

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| parse_error("ollama", e))?;

        let elapsed = start_time.elapsed();

        if let Some(error) = body.error {
            return Err(TierError::Llm(LlmError::with_provider(
                ErrorCategory::Unavailable,
                format!("Ollama returned an error: {}", error),
                "ollama",
            )));
        }

        let usage = TokenUsage::from_ollama(
            body.prompt_eval_count.unwrap_or(0),
            body.eval_count.unwrap_or(0),
        );

        Ok(LlmResponse::with_metrics(
            body.response,
            usage,
            ResponseTiming::from_duration(elapsed),
            ResponseMetadata {
                model: self.model.clone(),
                provider: "ollama".to_string(),
            },
        ))
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.api_base);

        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                if let Ok(tags) = resp.json::<OllamaTagsResponse>().await {
                    if tags.has_model(&self.model) {
                        info!("Ollama is available with model: {}", self.model);
                        Ok(true)
                    } else {
                        warn!(
                            "Ollama is running but model '{}' not found. Pull with: ollama pull {}",
                            self.model, self.model
                        );
                        Ok(false)
                    }
                } else {
                    info!("Ollama is available");
                    Ok(true)
                }
            }
            Ok(resp) => {
                warn!("Ollama API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Ollama not available: {}. Start with: ollama serve", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

impl OllamaTagsResponse {
    /// `llama3` matches `llama3:latest` and other tags of the same model
    fn has_model(&self, model: &str) -> bool {
        let base = model.strip_suffix(":latest").unwrap_or(model);
        self.models.iter().any(|m| {
            m.name == model
                || m.name
                    .split_once(':')
                    .map_or(m.name == base, |(name, _)| name == base)
        })
    }
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::ComplexityTier;

    fn provider_config() -> ProviderConfig {
        ProviderConfig::for_tier(&Config::default(), ComplexityTier::Simple)
    }

    #[test]
    fn test_default_config() {
        let provider = OllamaProvider::new(provider_config()).unwrap();
        assert_eq!(provider.api_base, DEFAULT_API_BASE);
        assert_eq!(provider.model, "tinyllama");
    }

    #[test]
    fn test_request_shape() {
        let provider = OllamaProvider::new(provider_config()).unwrap();
        let json = serde_json::to_value(provider.build_request("hi")).unwrap();
        assert_eq!(json["model"], "tinyllama");
        assert_eq!(json["prompt"], "hi");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 2048);
    }

    #[test]
    fn test_response_without_counts() {
        let body: OllamaResponse = serde_json::from_str(r#"{"response": ""}"#).unwrap();
        assert_eq!(body.response, "");
        assert!(body.eval_count.is_none());
    }

    #[test]
    fn test_tags_matching() {
        let tags: OllamaTagsResponse = serde_json::from_str(
            r#"{"models": [{"name": "llama3:latest"}, {"name": "mistral:7b"}]}"#,
        )
        .unwrap();
        assert!(tags.has_model("llama3"));
        assert!(tags.has_model("llama3:latest"));
        assert!(tags.has_model("mistral"));
        assert!(!tags.has_model("tinyllama"));
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let mut config = provider_config();
        config.api_base = Some("ftp://localhost:11434".to_string());
        assert!(OllamaProvider::new(config).is_err());
    }
}
