//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/tierwise/) and project (.tierwise/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{cache, fallback, models, network, routing};
use crate::types::{ComplexityTier, Result, TierError};

/// Provider names accepted by `backend.provider` and per-tier overrides
pub const SUPPORTED_PROVIDERS: &[&str] = &["ollama", "openai", "gemini"];

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Backend transport settings
    pub backend: BackendConfig,

    /// Model bound to each tier
    pub models: ModelsConfig,

    /// Classifier thresholds and keywords
    pub routing: RoutingConfig,

    /// Response cache settings
    pub cache: CacheConfig,

    /// Escalation settings
    pub fallback: FallbackConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            backend: BackendConfig::default(),
            models: ModelsConfig::default(),
            routing: RoutingConfig::default(),
            cache: CacheConfig::default(),
            fallback: FallbackConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `TierError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.backend.temperature) {
            return Err(TierError::Config(format!(
                "backend.temperature must be between 0.0 and 2.0, got {}",
                self.backend.temperature
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(TierError::Config(
                "backend.timeout_secs must be greater than 0".to_string(),
            ));
        }

        validate_provider(&self.backend.provider, "backend.provider")?;

        for tier in ComplexityTier::ALL {
            let binding = self.models.binding(tier);
            if binding.model.trim().is_empty() {
                return Err(TierError::Config(format!(
                    "models.{}.model must not be empty",
                    tier
                )));
            }
            if binding.max_tokens == 0 {
                return Err(TierError::Config(format!(
                    "models.{}.max_tokens must be greater than 0",
                    tier
                )));
            }
            if let Some(provider) = &binding.provider {
                validate_provider(provider, &format!("models.{}.provider", tier))?;
            }
        }

        if self.routing.max_simple_length > self.routing.max_medium_length {
            return Err(TierError::Config(format!(
                "routing.max_simple_length ({}) must not exceed routing.max_medium_length ({})",
                self.routing.max_simple_length, self.routing.max_medium_length
            )));
        }

        if self.fallback.max_retries > fallback::MAX_RETRIES {
            return Err(TierError::Config(format!(
                "fallback.max_retries must be at most {} (the tier ladder has two escalation steps), got {}",
                fallback::MAX_RETRIES,
                self.fallback.max_retries
            )));
        }

        Ok(())
    }

    /// Effective provider for a tier (per-tier override or backend default)
    pub fn provider_for(&self, tier: ComplexityTier) -> &str {
        self.models
            .binding(tier)
            .provider
            .as_deref()
            .unwrap_or(&self.backend.provider)
    }
}

fn validate_provider(provider: &str, field: &str) -> Result<()> {
    if SUPPORTED_PROVIDERS.contains(&provider) {
        Ok(())
    } else {
        Err(TierError::Config(format!(
            "{} '{}' is not supported. Valid values: {}",
            field,
            provider,
            SUPPORTED_PROVIDERS.join(", ")
        )))
    }
}

// =============================================================================
// Backend Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Provider name (ollama, openai, gemini)
    pub provider: String,

    /// Override the provider's default API base URL
    pub api_base: Option<String>,

    /// API key for hosted providers (falls back to the provider's env var)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-invocation timeout in seconds
    pub timeout_secs: u64,

    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            api_base: None,
            api_key: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.0,
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("provider", &self.provider)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .finish()
    }
}

// =============================================================================
// Model Bindings
// =============================================================================

/// Concrete model bound to one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelBinding {
    /// Backend model identifier
    pub model: String,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Model exposes extended reasoning
    #[serde(default)]
    pub supports_thinking: bool,

    /// Provider override for this tier only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

fn default_max_tokens() -> usize {
    models::MEDIUM_MAX_TOKENS
}

impl ModelBinding {
    pub fn new(model: impl Into<String>, max_tokens: usize) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            supports_thinking: false,
            provider: None,
        }
    }

    pub fn with_thinking(mut self) -> Self {
        self.supports_thinking = true;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub simple: ModelBinding,
    pub medium: ModelBinding,
    pub advanced: ModelBinding,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            simple: ModelBinding::new(models::SIMPLE_MODEL, models::SIMPLE_MAX_TOKENS),
            medium: ModelBinding::new(models::MEDIUM_MODEL, models::MEDIUM_MAX_TOKENS),
            advanced: ModelBinding::new(models::ADVANCED_MODEL, models::ADVANCED_MAX_TOKENS)
                .with_thinking(),
        }
    }
}

impl ModelsConfig {
    pub fn binding(&self, tier: ComplexityTier) -> &ModelBinding {
        match tier {
            ComplexityTier::Simple => &self.simple,
            ComplexityTier::Medium => &self.medium,
            ComplexityTier::Advanced => &self.advanced,
        }
    }
}

// =============================================================================
// Routing Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Queries up to this length may classify as simple
    pub max_simple_length: usize,

    /// Queries up to this length fall in the medium band
    pub max_medium_length: usize,

    /// Keywords that send a medium-band query to the advanced tier
    pub complex_keywords: Vec<String>,

    /// Keywords recognised in the medium band
    pub simple_keywords: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_simple_length: routing::MAX_SIMPLE_LENGTH,
            max_medium_length: routing::MAX_MEDIUM_LENGTH,
            complex_keywords: routing::COMPLEX_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            simple_keywords: routing::SIMPLE_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// =============================================================================
// Cache Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-lifetime map only
    Memory,
    /// Single JSON file keyed by query
    #[default]
    Json,
    /// Pooled SQLite database
    Sqlite,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Memory => write!(f, "memory"),
            CacheBackend::Json => write!(f, "json"),
            CacheBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "json" => Ok(CacheBackend::Json),
            "sqlite" => Ok(CacheBackend::Sqlite),
            _ => Err(format!(
                "Unknown cache backend: {}. Valid values: memory, json, sqlite",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable response caching
    pub enabled: bool,

    /// Persistence backend
    pub backend: CacheBackend,

    /// Store location; defaults depend on the backend
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::Json,
            path: None,
        }
    }
}

impl CacheConfig {
    /// Store path, falling back to the backend's default location
    pub fn resolved_path(&self) -> PathBuf {
        match (&self.path, self.backend) {
            (Some(path), _) => path.clone(),
            (None, CacheBackend::Sqlite) => PathBuf::from(cache::DEFAULT_SQLITE_PATH),
            (None, _) => PathBuf::from(cache::DEFAULT_JSON_PATH),
        }
    }
}

// =============================================================================
// Fallback Configuration
// =============================================================================

/// What to do once the escalation ladder is exhausted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OnExhausted {
    /// Return the best available response
    #[default]
    Degrade,
    /// Return an error carrying every attempt
    Fail,
}

impl std::fmt::Display for OnExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OnExhausted::Degrade => write!(f, "degrade"),
            OnExhausted::Fail => write!(f, "fail"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Case-insensitive phrases that mark a response as low confidence
    pub low_confidence_phrases: Vec<String>,

    /// Case-sensitive markers backends embed when they failed
    pub error_markers: Vec<String>,

    /// Minimum trimmed length of an acceptable response
    pub min_response_chars: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            low_confidence_phrases: fallback::LOW_CONFIDENCE_PHRASES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            error_markers: fallback::ERROR_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_response_chars: fallback::MIN_RESPONSE_CHARS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Escalate to a higher tier on failure or low quality
    pub enabled: bool,

    /// Maximum escalation steps
    pub max_retries: u8,

    /// Policy once escalation is exhausted
    pub on_exhausted: OnExhausted,

    /// Response quality checks
    pub quality: QualityConfig,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: fallback::MAX_RETRIES,
            on_exhausted: OnExhausted::Degrade,
            quality: QualityConfig::default(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.backend.provider, "ollama");
        assert_eq!(config.backend.timeout_secs, 120);
        assert_eq!(config.models.simple.model, "tinyllama");
        assert_eq!(config.models.medium.model, "mistral");
        assert_eq!(config.models.advanced.model, "llama3");
        assert!(config.models.advanced.supports_thinking);
        assert_eq!(config.routing.max_simple_length, 60);
        assert_eq!(config.routing.max_medium_length, 250);
        assert!(config.cache.enabled);
        assert_eq!(config.fallback.max_retries, 2);
        assert_eq!(config.fallback.on_exhausted, OnExhausted::Degrade);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let mut config = Config::default();
        config.models.medium.model = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("models.medium.model"));
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = Config::default();
        config.routing.max_simple_length = 300;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.backend.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_provider() {
        let mut config = Config::default();
        config.models.advanced.provider = Some("claude-code".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("models.advanced.provider"));
    }

    #[test]
    fn test_validate_rejects_excess_retries() {
        let mut config = Config::default();
        config.fallback.max_retries = 3;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("two escalation steps"));

        config.fallback.max_retries = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_for_tier_override() {
        let mut config = Config::default();
        config.models.advanced = config.models.advanced.clone().with_provider("gemini");
        assert_eq!(config.provider_for(ComplexityTier::Simple), "ollama");
        assert_eq!(config.provider_for(ComplexityTier::Advanced), "gemini");
    }

    #[test]
    fn test_cache_backend_parse_and_path() {
        assert_eq!("SQLITE".parse::<CacheBackend>().unwrap(), CacheBackend::Sqlite);
        assert!("redis".parse::<CacheBackend>().is_err());

        let mut cache = CacheConfig::default();
        assert_eq!(cache.resolved_path(), PathBuf::from(".tierwise/cache.json"));
        cache.backend = CacheBackend::Sqlite;
        assert_eq!(cache.resolved_path(), PathBuf::from(".tierwise/cache.db"));
        cache.path = Some(PathBuf::from("/tmp/x.db"));
        assert_eq!(cache.resolved_path(), PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_api_key_not_serialized_or_debugged() {
        let mut config = Config::default();
        config.backend.api_key = Some("sk-secret".to_string());
        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("sk-secret"));
        assert!(!format!("{:?}", config.backend).contains("sk-secret"));
    }
}
