//! AI Integration Layer
//!
//! Model providers, the tier gateway the router talks to, invocation
//! timeouts and usage metrics.

pub mod gateway;
pub mod metrics;
pub mod provider;
pub mod timeout;

pub use gateway::{Completion, ModelGateway, TierGateway};
pub use metrics::{MetricsSummary, RouterMetrics, SharedMetrics, create_shared_metrics};
pub use provider::{
    ErrorCategory, ErrorClassifier, GeminiProvider, LlmError, LlmProvider, LlmResponse,
    OllamaProvider, OpenAiProvider, ProviderConfig, ResponseMetadata, ResponseTiming,
    SharedProvider, TokenUsage, create_provider,
};
pub use timeout::{TimeoutConfig, with_timeout};
