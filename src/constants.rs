//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Classifier constants
pub mod routing {
    /// Queries up to this many characters may classify as simple
    pub const MAX_SIMPLE_LENGTH: usize = 60;

    /// Queries up to this many characters fall in the medium band
    pub const MAX_MEDIUM_LENGTH: usize = 250;

    /// Leading words that mark a short query as a simple factual question
    pub const SIMPLE_FACTUAL_PATTERN: &str = r"(?i)^(what|when|where|who|how|is|are|can|do|does)\s+";

    /// Keywords that push a medium-length query to the advanced tier
    pub const COMPLEX_KEYWORDS: &[&str] = &[
        "explain",
        "analyze",
        "compare",
        "contrast",
        "evaluate",
        "synthesize",
        "critique",
        "interpret",
        "discuss",
        "theorize",
        "in depth",
    ];

    /// Keywords recognised in the medium band (outcome is medium either way)
    pub const SIMPLE_KEYWORDS: &[&str] = &[
        "what is", "when was", "where is", "who is", "how to", "define", "list",
    ];
}

/// Escalation constants
pub mod fallback {
    /// Maximum escalation steps (Simple -> Medium -> Advanced)
    pub const MAX_RETRIES: u8 = 2;

    /// Phrases that mark a response as low confidence
    pub const LOW_CONFIDENCE_PHRASES: &[&str] = &["I don't know", "I'm not sure"];

    /// Markers that backends embed in text when they failed
    pub const ERROR_MARKERS: &[&str] = &["API_ERROR", "OLLAMA_ERROR"];

    /// Minimum trimmed response length to be accepted
    pub const MIN_RESPONSE_CHARS: usize = 1;
}

/// Default model bindings per tier
pub mod models {
    pub const SIMPLE_MODEL: &str = "tinyllama";
    pub const MEDIUM_MODEL: &str = "mistral";
    pub const ADVANCED_MODEL: &str = "llama3";

    pub const SIMPLE_MAX_TOKENS: usize = 2048;
    pub const MEDIUM_MAX_TOKENS: usize = 4096;
    pub const ADVANCED_MAX_TOKENS: usize = 8192;
}

/// Cache constants
pub mod cache {
    /// Sentinel model name reported for cache hits
    pub const CACHED_MODEL: &str = "cached";

    /// Route label reported for cache hits
    pub const CACHE_ROUTE: &str = "cache";

    /// Default JSON cache file (project relative)
    pub const DEFAULT_JSON_PATH: &str = ".tierwise/cache.json";

    /// Default SQLite cache database (project relative)
    pub const DEFAULT_SQLITE_PATH: &str = ".tierwise/cache.db";
}

/// HTTP/Network constants
pub mod network {
    /// Default per-invocation timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Timeout for health checks (seconds)
    pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 10;
}

/// Evaluation constants
pub mod eval {
    /// Default evaluation log written by `batch`
    pub const DEFAULT_LOG_PATH: &str = "evaluation_log.json";

    /// Default concurrency for batch routing
    pub const DEFAULT_BATCH_CONCURRENCY: usize = 1;
}
