//! Model Gateway
//!
//! Tier-addressed access to text completion. The router only sees
//! `ModelGateway`: give it a tier and a prompt, get text back or a
//! `ModelInvocationError` naming the tier and model that failed.
//!
//! `TierGateway` binds one provider per tier from configuration and wraps
//! every call in the per-invocation timeout. It never judges response
//! quality; low-confidence or empty text is returned as-is.

use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, warn};

use super::provider::{ProviderConfig, SharedProvider, TokenUsage, create_provider};
use super::timeout::{TimeoutConfig, with_timeout};
use crate::config::{Config, ModelBinding, ModelsConfig};
use crate::types::{ComplexityTier, ModelInvocationError, Result};

/// Text produced by one successful gateway call
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub usage: TokenUsage,
    pub latency_ms: u64,
}

/// Capability the router depends on
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Produce a completion with the model bound to `tier`
    async fn generate(
        &self,
        tier: ComplexityTier,
        prompt: &str,
    ) -> std::result::Result<Completion, ModelInvocationError>;

    /// Model bound to `tier`
    fn binding(&self, tier: ComplexityTier) -> &ModelBinding;

    /// Whether the tier's backend is reachable and has its model
    async fn health_check(&self, tier: ComplexityTier) -> bool;
}

/// Concrete gateway: one provider per tier
pub struct TierGateway {
    bindings: ModelsConfig,
    providers: [SharedProvider; 3],
    timeouts: TimeoutConfig,
}

impl TierGateway {
    /// Build providers for every tier; unknown providers or bad endpoints are fatal
    pub fn from_config(config: &Config) -> Result<Self> {
        let build = |tier| create_provider(&ProviderConfig::for_tier(config, tier));
        Ok(Self {
            bindings: config.models.clone(),
            providers: [
                build(ComplexityTier::Simple)?,
                build(ComplexityTier::Medium)?,
                build(ComplexityTier::Advanced)?,
            ],
            timeouts: TimeoutConfig::from_config(config),
        })
    }

    /// Assemble from pre-built providers (simple, medium, advanced)
    pub fn with_providers(
        bindings: ModelsConfig,
        providers: [SharedProvider; 3],
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            bindings,
            providers,
            timeouts,
        }
    }

    fn provider(&self, tier: ComplexityTier) -> &SharedProvider {
        match tier {
            ComplexityTier::Simple => &self.providers[0],
            ComplexityTier::Medium => &self.providers[1],
            ComplexityTier::Advanced => &self.providers[2],
        }
    }
}

#[async_trait]
impl ModelGateway for TierGateway {
    async fn generate(
        &self,
        tier: ComplexityTier,
        prompt: &str,
    ) -> std::result::Result<Completion, ModelInvocationError> {
        let model = &self.binding(tier).model;
        let provider = self.provider(tier);
        let operation = format!("{} tier ({})", tier, model);
        let start = Instant::now();

        debug!(tier = %tier, model = %model, provider = provider.name(), "Invoking model");

        match with_timeout(self.timeouts.invocation, provider.generate(prompt), &operation).await
        {
            Ok(response) => Ok(Completion {
                text: response.content,
                model: model.clone(),
                usage: response.usage,
                latency_ms: start.elapsed().as_millis() as u64,
            }),
            Err(err) => {
                let invocation = ModelInvocationError::from_error(tier, model, &err);
                warn!(
                    tier = %tier,
                    model = %model,
                    category = %invocation.category,
                    "Model invocation failed: {}",
                    invocation.message
                );
                Err(invocation)
            }
        }
    }

    fn binding(&self, tier: ComplexityTier) -> &ModelBinding {
        self.bindings.binding(tier)
    }

    async fn health_check(&self, tier: ComplexityTier) -> bool {
        let operation = format!("{} tier health check", tier);
        with_timeout(
            self.timeouts.health_check,
            self.provider(tier).health_check(),
            &operation,
        )
        .await
        .unwrap_or_else(|e| {
            warn!(tier = %tier, "Health check failed: {}", e);
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{LlmProvider, LlmResponse};
    use crate::types::{ErrorCategory, ErrorClassifier, TierError};
    use std::sync::Arc;
    use std::time::Duration;

    /// Provider returning a fixed outcome
    struct MockProvider {
        model: String,
        reply: std::result::Result<String, String>,
        delay: Duration,
    }

    impl MockProvider {
        fn ok(model: &str, text: &str) -> SharedProvider {
            Arc::new(Self {
                model: model.to_string(),
                reply: Ok(text.to_string()),
                delay: Duration::ZERO,
            })
        }

        fn failing(model: &str, message: &str) -> SharedProvider {
            Arc::new(Self {
                model: model.to_string(),
                reply: Err(message.to_string()),
                delay: Duration::ZERO,
            })
        }

        fn slow(model: &str) -> SharedProvider {
            Arc::new(Self {
                model: model.to_string(),
                reply: Ok("late".to_string()),
                delay: Duration::from_secs(5),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn generate(&self, _prompt: &str) -> Result<LlmResponse> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.reply {
                Ok(text) => Ok(LlmResponse::content_only(text.clone())),
                Err(message) => Err(TierError::Llm(ErrorClassifier::classify(message, "mock"))),
            }
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            &self.model
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(self.reply.is_ok())
        }
    }

    fn gateway(providers: [SharedProvider; 3]) -> TierGateway {
        TierGateway::with_providers(
            ModelsConfig::default(),
            providers,
            TimeoutConfig {
                invocation: Duration::from_millis(50),
                health_check: Duration::from_millis(50),
            },
        )
    }

    #[tokio::test]
    async fn test_generate_routes_to_tier_model() {
        let gw = gateway([
            MockProvider::ok("tinyllama", "small"),
            MockProvider::ok("mistral", "medium"),
            MockProvider::ok("llama3", "large"),
        ]);

        let completion = gw.generate(ComplexityTier::Medium, "q").await.unwrap();
        assert_eq!(completion.text, "medium");
        assert_eq!(completion.model, "mistral");
    }

    #[tokio::test]
    async fn test_failure_is_tagged_with_tier_and_category() {
        let gw = gateway([
            MockProvider::failing("tinyllama", "Failed to connect to Ollama at http://localhost:11434"),
            MockProvider::ok("mistral", "ok"),
            MockProvider::ok("llama3", "ok"),
        ]);

        let err = gw.generate(ComplexityTier::Simple, "q").await.unwrap_err();
        assert_eq!(err.tier, ComplexityTier::Simple);
        assert_eq!(err.model, "tinyllama");
        assert_eq!(err.category, ErrorCategory::Network);
    }

    #[tokio::test]
    async fn test_low_confidence_text_returned_verbatim() {
        let gw = gateway([
            MockProvider::ok("tinyllama", "I don't know"),
            MockProvider::ok("mistral", ""),
            MockProvider::ok("llama3", "ok"),
        ]);

        assert_eq!(gw.generate(ComplexityTier::Simple, "q").await.unwrap().text, "I don't know");
        assert_eq!(gw.generate(ComplexityTier::Medium, "q").await.unwrap().text, "");
    }

    #[tokio::test]
    async fn test_timeout_maps_to_timeout_category() {
        let gw = gateway([
            MockProvider::ok("tinyllama", "ok"),
            MockProvider::ok("mistral", "ok"),
            MockProvider::slow("llama3"),
        ]);

        let err = gw.generate(ComplexityTier::Advanced, "q").await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::Timeout);
        assert_eq!(err.model, "llama3");
    }

    #[tokio::test]
    async fn test_health_check_per_tier() {
        let gw = gateway([
            MockProvider::ok("tinyllama", "ok"),
            MockProvider::failing("mistral", "down"),
            MockProvider::slow("llama3"),
        ]);

        assert!(gw.health_check(ComplexityTier::Simple).await);
        assert!(!gw.health_check(ComplexityTier::Medium).await);
    }

    #[test]
    fn test_from_config_builds_default_ollama_tiers() {
        let gw = TierGateway::from_config(&Config::default()).unwrap();
        assert_eq!(gw.binding(ComplexityTier::Simple).model, "tinyllama");
        assert_eq!(gw.provider(ComplexityTier::Advanced).model(), "llama3");
    }

    #[test]
    fn test_from_config_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.backend.api_base = Some("gopher://example".to_string());
        assert!(TierGateway::from_config(&config).is_err());
    }
}
