//! LLM Provider Abstraction
//!
//! Defines the LlmProvider trait for plain-text completion.
//! All providers return `LlmResponse` with token usage metrics.
//!
//! ## Modules
//!
//! - `ollama`: local Ollama server (`/api/generate`)
//! - `openai`: OpenAI-compatible chat completions
//! - `gemini`: Google Gemini `generateContent`
//! - `http`: shared endpoint validation and HTTP error mapping

mod gemini;
mod http;
mod ollama;
mod openai;

pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{Config, SUPPORTED_PROVIDERS};
use crate::types::{ComplexityTier, Result, TierError};

// =============================================================================
// LLM Response with Usage Metrics
// =============================================================================

/// Complete LLM response including text and usage metrics
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text, returned verbatim (may be empty)
    pub content: String,
    /// Token usage metrics
    pub usage: TokenUsage,
    /// Response timing
    pub timing: ResponseTiming,
    /// Provider and model info
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Create response with content only (usage unknown)
    pub fn content_only(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }

    /// Create full response with all metrics
    pub fn with_metrics(
        content: String,
        usage: TokenUsage,
        timing: ResponseTiming,
        metadata: ResponseMetadata,
    ) -> Self {
        Self {
            content,
            usage,
            timing,
            metadata,
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens (prompt)
    pub input_tokens: u32,
    /// Output tokens (response)
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used (input + output)
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    /// Create from OpenAI-style usage response
    pub fn from_openai(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            input_tokens: prompt_tokens,
            output_tokens: completion_tokens,
        }
    }

    /// Create from Ollama-style usage response
    pub fn from_ollama(prompt_eval_count: u32, eval_count: u32) -> Self {
        Self {
            input_tokens: prompt_eval_count,
            output_tokens: eval_count,
        }
    }

    /// Create from Gemini `usageMetadata`
    pub fn from_gemini(prompt_token_count: u32, candidates_token_count: u32) -> Self {
        Self {
            input_tokens: prompt_token_count,
            output_tokens: candidates_token_count,
        }
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Total response time in milliseconds (wall clock)
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: std::time::Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

/// Response metadata
#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    /// Model used
    pub model: String,
    /// Provider name
    pub provider: String,
}

/// Shared LLM provider type for concurrent access across requests.
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for one provider instance (one per tier)
///
/// Note: API keys are handled securely - they are never serialized to output
/// and are redacted in debug output. Each provider converts the key to
/// SecretString internally for runtime protection.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type: "ollama", "openai", "gemini"
    pub provider: String,
    /// Model name (provider-specific)
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,
    /// API key for hosted providers
    /// Never serialized to output for security
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: usize,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ProviderConfig {
    /// Provider settings for one tier: binding + shared backend settings
    pub fn for_tier(config: &Config, tier: ComplexityTier) -> Self {
        let binding = config.models.binding(tier);
        Self {
            provider: config.provider_for(tier).to_string(),
            model: binding.model.clone(),
            timeout_secs: config.backend.timeout_secs,
            temperature: config.backend.temperature,
            api_key: config.backend.api_key.clone(),
            api_base: config.backend.api_base.clone(),
            max_tokens: binding.max_tokens,
        }
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// LLM Provider trait for text completion with usage metrics
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for the prompt
    ///
    /// Text is returned verbatim; judging its quality is the caller's concern.
    async fn generate(&self, prompt: &str) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Check if the provider is available
    async fn health_check(&self) -> Result<bool>;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.clone())?)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        "gemini" => Ok(Arc::new(GeminiProvider::new(config.clone())?)),
        _ => Err(TierError::Config(format!(
            "Unknown provider: {}. Supported: {}",
            config.provider,
            SUPPORTED_PROVIDERS.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_tier_uses_binding_and_backend() {
        let mut config = Config::default();
        config.backend.timeout_secs = 30;
        config.models.advanced = config.models.advanced.clone().with_provider("gemini");

        let simple = ProviderConfig::for_tier(&config, ComplexityTier::Simple);
        assert_eq!(simple.provider, "ollama");
        assert_eq!(simple.model, "tinyllama");
        assert_eq!(simple.max_tokens, 2048);
        assert_eq!(simple.timeout_secs, 30);

        let advanced = ProviderConfig::for_tier(&config, ComplexityTier::Advanced);
        assert_eq!(advanced.provider, "gemini");
        assert_eq!(advanced.max_tokens, 8192);
    }

    #[test]
    fn test_create_unknown_provider() {
        let mut config = ProviderConfig::for_tier(&Config::default(), ComplexityTier::Simple);
        config.provider = "claude-code".to_string();
        let err = create_provider(&config).err().unwrap();
        assert!(matches!(err, TierError::Config(_)));
    }

    #[test]
    fn test_create_ollama_provider() {
        let config = ProviderConfig::for_tier(&Config::default(), ComplexityTier::Medium);
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model(), "mistral");
    }

    #[test]
    fn test_debug_redacts_key() {
        let mut config = ProviderConfig::for_tier(&Config::default(), ComplexityTier::Simple);
        config.api_key = Some("sk-very-secret".to_string());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_token_usage_total() {
        assert_eq!(TokenUsage::from_gemini(12, 30).total(), 42);
    }
}
