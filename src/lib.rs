//! tierwise - Complexity-Aware Query Router
//!
//! Sends each query to the cheapest model tier likely to answer it well,
//! serves repeats from a response cache, and escalates to a stronger tier
//! when a model fails or hedges.
//!
//! ## Core Features
//!
//! - **Heuristic Classification**: length bands, question words and keywords pick Simple, Medium or Advanced
//! - **Bounded Escalation**: Simple → Medium → Advanced, at most `max_retries` steps
//! - **Response Cache**: in-memory with optional JSON or SQLite persistence
//! - **Multiple Backends**: Ollama, OpenAI and Gemini providers behind one gateway
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tierwise::{Config, QueryRouter, ResponseCache, TierGateway};
//!
//! let config = Config::default();
//! let cache = Arc::new(ResponseCache::from_config(&config.cache)?);
//! let gateway = Arc::new(TierGateway::from_config(&config)?);
//! let router = QueryRouter::new(&config, cache, gateway);
//!
//! let result = router.route_default("what is the capital of France?").await?;
//! println!("{} via {}", result.response, result.route);
//! ```
//!
//! ## Modules
//!
//! - [`routing`]: classifier, quality policy and the escalating router
//! - [`ai`]: model gateway, providers, timeouts and metrics
//! - [`cache`]: response cache and its persistent stores
//! - [`storage`]: SQLite persistence with connection pooling
//! - [`config`]: layered configuration
//! - [`eval`]: evaluation logs and reports

pub mod ai;
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod eval;
pub mod routing;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, ModelInvocationError, Result, ResultExt, TierError};
pub use types::{ComplexityTier, RunId};

// Storage
pub use storage::database::PoolConfig;
pub use storage::{Database, SharedDatabase};

// =============================================================================
// Routing Re-exports
// =============================================================================

pub use cache::{CacheEntry, CacheStats, CacheStore, ResponseCache};
pub use routing::{QueryClassifier, QueryRouter, RouteOutcome, RoutingResult};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    Completion,
    LlmProvider,
    LlmResponse,
    ModelGateway,
    // Metrics
    RouterMetrics,
    SharedMetrics,
    TierGateway,
    // Timeout
    TimeoutConfig,
    with_timeout,
};
