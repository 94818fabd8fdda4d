//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Provides error classification so routing decisions and logs can tell
//! a refused connection from a quota failure or a malformed response.
//!
//! ## Error Categories
//!
//! - **Network**: Connectivity issues (backend not running, DNS, reset)
//! - **Timeout**: Invocation exceeded its deadline
//! - **RateLimit**: Quota or rate limiting
//! - **Auth**: Authentication failures
//! - **Unavailable**: Backend or model unavailable
//! - **ParseError**: Malformed backend response
//!
//! ## Design Principles
//!
//! - Single unified error type (TierError) for the entire application
//! - Invocation failures carry the tier and model that produced them
//! - No panic/unwrap - all errors are recoverable

use std::time::Duration;
use thiserror::Error;

use super::ComplexityTier;
use crate::routing::AttemptRecord;

// =============================================================================
// Error Categories
// =============================================================================

/// Failure categories for model invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rate limited or quota exhausted
    RateLimit,
    /// Prompt exceeded the model context
    TokenLimit,
    /// Authentication failed
    Auth,
    /// Network/connectivity issues
    Network,
    /// Invocation deadline exceeded
    Timeout,
    /// Backend or model unavailable
    Unavailable,
    /// Invalid request
    BadRequest,
    /// Backend response could not be parsed
    ParseError,
    /// Temporary server issues
    Transient,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Provider-level error with category and provider context
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
        }
    }
}

// =============================================================================
// Model Invocation Error
// =============================================================================

/// A failed gateway call, tagged with the tier and model that were attempted
#[derive(Debug, Clone, Error)]
#[error("{tier} tier ({model}) failed [{category}]: {message}")]
pub struct ModelInvocationError {
    pub tier: ComplexityTier,
    pub model: String,
    pub category: ErrorCategory,
    pub message: String,
}

impl ModelInvocationError {
    pub fn new(
        tier: ComplexityTier,
        model: impl Into<String>,
        category: ErrorCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tier,
            model: model.into(),
            category,
            message: message.into(),
        }
    }

    /// Build from any application error, classifying its cause
    pub fn from_error(tier: ComplexityTier, model: &str, err: &TierError) -> Self {
        let classified = ErrorClassifier::classify_error(err, model);
        Self::new(tier, model, classified.category, classified.message)
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps provider error text and HTTP statuses to categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any provider
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota")
        {
            return LlmError::with_provider(ErrorCategory::RateLimit, message, provider);
        }

        if lower.contains("token")
            && (lower.contains("limit") || lower.contains("exceed") || lower.contains("maximum"))
            || lower.contains("context length")
        {
            return LlmError::with_provider(ErrorCategory::TokenLimit, message, provider);
        }

        if lower.contains("auth")
            || lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
        {
            return LlmError::with_provider(ErrorCategory::Auth, message, provider);
        }

        if lower.contains("timed out") || lower.contains("timeout") {
            return LlmError::with_provider(ErrorCategory::Timeout, message, provider);
        }

        if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("connect")
            || lower.contains("dns")
            || lower.contains("unreachable")
        {
            return LlmError::with_provider(ErrorCategory::Network, message, provider);
        }

        if lower.contains("503")
            || lower.contains("502")
            || lower.contains("service unavailable")
            || lower.contains("not found")
            || lower.contains("not installed")
        {
            return LlmError::with_provider(ErrorCategory::Unavailable, message, provider);
        }

        if lower.contains("parse")
            || lower.contains("json")
            || lower.contains("malformed")
            || lower.contains("unexpected token")
        {
            return LlmError::with_provider(ErrorCategory::ParseError, message, provider);
        }

        if lower.contains("400") || lower.contains("bad request") || lower.contains("invalid") {
            return LlmError::with_provider(ErrorCategory::BadRequest, message, provider);
        }

        if lower.contains("500")
            || lower.contains("server error")
            || lower.contains("temporary")
            || lower.contains("overloaded")
        {
            return LlmError::with_provider(ErrorCategory::Transient, message, provider);
        }

        LlmError::with_provider(ErrorCategory::Unknown, message, provider)
    }

    /// Classify HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            400 | 422 => LlmError::with_provider(ErrorCategory::BadRequest, message, provider),
            404 | 502 | 503 => LlmError::with_provider(ErrorCategory::Unavailable, message, provider),
            500 | 504 => LlmError::with_provider(ErrorCategory::Transient, message, provider),
            _ => LlmError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }

    /// Classify a TierError with type-based routing before falling back to text
    pub fn classify_error(err: &TierError, provider: &str) -> LlmError {
        match err {
            TierError::Llm(llm_err) => LlmError {
                provider: llm_err.provider.clone().or_else(|| Some(provider.to_string())),
                ..llm_err.clone()
            },
            TierError::Timeout { .. } => {
                LlmError::with_provider(ErrorCategory::Timeout, err.to_string(), provider)
            }
            TierError::Json(_) => {
                LlmError::with_provider(ErrorCategory::ParseError, err.to_string(), provider)
            }
            TierError::Io(_) => {
                LlmError::with_provider(ErrorCategory::Network, err.to_string(), provider)
            }
            TierError::Config(_) => {
                LlmError::with_provider(ErrorCategory::BadRequest, err.to_string(), provider)
            }
            TierError::LlmApi(msg) => Self::classify(msg, provider),
            _ => LlmError::with_provider(ErrorCategory::Unknown, err.to_string(), provider),
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum TierError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // LLM Errors
    // -------------------------------------------------------------------------
    /// Structured provider error with category
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Simple LLM API error (use Llm variant for structured errors)
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// Gateway call failed for a specific tier
    #[error("Model invocation error: {0}")]
    Invocation(#[from] ModelInvocationError),

    /// Every tier on the escalation ladder was tried without an acceptable answer
    #[error("Escalation exhausted for '{query}' after {} attempt(s): {}", attempts.len(), describe_attempts(attempts))]
    ExhaustedEscalation {
        query: String,
        attempts: Vec<AttemptRecord>,
    },

    /// Operation timeout with context
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<LlmError> for TierError {
    fn from(err: LlmError) -> Self {
        TierError::Llm(err)
    }
}

fn describe_attempts(attempts: &[AttemptRecord]) -> String {
    attempts
        .iter()
        .map(|a| format!("{} ({}): {}", a.tier, a.model, a.outcome))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, TierError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl TierError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create an LLM error with category
    pub fn llm(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::Llm(LlmError::new(category, message))
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| TierError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| TierError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::AttemptOutcome;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::Network.to_string(), "NETWORK");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = ErrorClassifier::classify("Rate limit exceeded, please retry", "openai");
        assert_eq!(err.category, ErrorCategory::RateLimit);

        let quota = ErrorClassifier::classify("Quota exhausted for project", "gemini");
        assert_eq!(quota.category, ErrorCategory::RateLimit);
    }

    #[test]
    fn test_classify_auth() {
        let err = ErrorClassifier::classify("Invalid API key provided", "openai");
        assert_eq!(err.category, ErrorCategory::Auth);
    }

    #[test]
    fn test_classify_network() {
        let err = ErrorClassifier::classify(
            "Failed to connect to Ollama at http://localhost:11434",
            "ollama",
        );
        assert_eq!(err.category, ErrorCategory::Network);
    }

    #[test]
    fn test_classify_timeout_before_network() {
        let err = ErrorClassifier::classify("Connection timed out after 30s", "ollama");
        assert_eq!(err.category, ErrorCategory::Timeout);
    }

    #[test]
    fn test_classify_parse() {
        let err = ErrorClassifier::classify("Failed to parse Ollama response", "ollama");
        assert_eq!(err.category, ErrorCategory::ParseError);
    }

    #[test]
    fn test_classify_unknown() {
        let err = ErrorClassifier::classify("Something weird happened", "test");
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_classify_http_status() {
        let rate_limit = ErrorClassifier::classify_http_status(429, "Rate limited", "test");
        assert_eq!(rate_limit.category, ErrorCategory::RateLimit);

        let auth = ErrorClassifier::classify_http_status(401, "Unauthorized", "test");
        assert_eq!(auth.category, ErrorCategory::Auth);

        let missing_model = ErrorClassifier::classify_http_status(404, "model not found", "test");
        assert_eq!(missing_model.category, ErrorCategory::Unavailable);
    }

    #[test]
    fn test_classify_error_keeps_structured_category() {
        let err = TierError::Llm(LlmError::new(ErrorCategory::Auth, "bad key"));
        let classified = ErrorClassifier::classify_error(&err, "openai");
        assert_eq!(classified.category, ErrorCategory::Auth);
        assert_eq!(classified.provider.as_deref(), Some("openai"));

        let timeout = TierError::timeout("simple tier", Duration::from_secs(5));
        let classified = ErrorClassifier::classify_error(&timeout, "ollama");
        assert_eq!(classified.category, ErrorCategory::Timeout);
    }

    #[test]
    fn test_invocation_error_display() {
        let err = ModelInvocationError::new(
            ComplexityTier::Simple,
            "tinyllama",
            ErrorCategory::Network,
            "connection refused",
        );
        assert_eq!(
            err.to_string(),
            "simple tier (tinyllama) failed [NETWORK]: connection refused"
        );
    }

    #[test]
    fn test_exhausted_escalation_lists_chain() {
        let err = TierError::ExhaustedEscalation {
            query: "q".to_string(),
            attempts: vec![
                AttemptRecord {
                    tier: ComplexityTier::Simple,
                    model: "tinyllama".to_string(),
                    outcome: AttemptOutcome::Failed {
                        category: ErrorCategory::Network,
                        message: "refused".to_string(),
                    },
                    duration_ms: 1,
                },
                AttemptRecord {
                    tier: ComplexityTier::Medium,
                    model: "mistral".to_string(),
                    outcome: AttemptOutcome::LowQuality {
                        reason: "empty response".to_string(),
                    },
                    duration_ms: 1,
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("2 attempt(s)"));
        assert!(text.contains("simple (tinyllama)"));
        assert!(text.contains("medium (mistral)"));
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "Too many requests", "openai");
        assert_eq!(err.to_string(), "[openai:RATE_LIMIT] Too many requests");

        let err_no_provider = LlmError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(err_no_provider.to_string(), "[NETWORK] Connection failed");
    }
}
