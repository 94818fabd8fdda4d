//! Router Metrics Collection
//!
//! Aggregates request, cache, escalation and token counters across routed
//! queries. Thread-safe for concurrent batch routing.
//!
//! ## Usage
//!
//! ```ignore
//! let metrics = RouterMetrics::new("run-123");
//! metrics.record_invocation(ComplexityTier::Simple, &usage, 420);
//! println!("{}", metrics.snapshot().display());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use crate::ai::provider::TokenUsage;
use crate::types::ComplexityTier;

// =============================================================================
// Metrics Collector
// =============================================================================

/// Thread-safe counters for routed queries.
pub struct RouterMetrics {
    /// Run identifier
    run_id: String,
    /// Collector start time
    start_time: Instant,
    requests: AtomicU32,
    cache_hits: AtomicU32,
    escalations: AtomicU32,
    failures: AtomicU32,
    /// Invocations per tier, indexed by ladder position
    invocations: [AtomicU32; 3],
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
    /// Total invocation latency in milliseconds
    total_latency_ms: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub run_id: String,
    pub total_duration_ms: u64,
    pub requests: u32,
    pub cache_hits: u32,
    pub escalations: u32,
    pub failures: u32,
    /// (tier, invocation count) in ladder order
    pub invocations: Vec<(ComplexityTier, u32)>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub avg_latency_ms: f64,
}

fn tier_index(tier: ComplexityTier) -> usize {
    match tier {
        ComplexityTier::Simple => 0,
        ComplexityTier::Medium => 1,
        ComplexityTier::Advanced => 2,
    }
}

impl RouterMetrics {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            start_time: Instant::now(),
            requests: AtomicU32::new(0),
            cache_hits: AtomicU32::new(0),
            escalations: AtomicU32::new(0),
            failures: AtomicU32::new(0),
            invocations: [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)],
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_escalation(&self) {
        self.escalations.fetch_add(1, Ordering::Relaxed);
    }

    /// A request that ended without any usable text
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one gateway call, successful or not
    pub fn record_invocation(&self, tier: ComplexityTier, usage: &TokenUsage, latency_ms: u64) {
        self.invocations[tier_index(tier)].fetch_add(1, Ordering::Relaxed);
        self.input_tokens
            .fetch_add(usage.input_tokens as u64, Ordering::Relaxed);
        self.output_tokens
            .fetch_add(usage.output_tokens as u64, Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSummary {
        let invocations: Vec<(ComplexityTier, u32)> = ComplexityTier::ALL
            .iter()
            .map(|&tier| (tier, self.invocations[tier_index(tier)].load(Ordering::Relaxed)))
            .collect();
        let total_calls: u32 = invocations.iter().map(|(_, n)| n).sum();
        let input_tokens = self.input_tokens.load(Ordering::Relaxed);
        let output_tokens = self.output_tokens.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        let avg_latency = if total_calls > 0 {
            total_latency as f64 / total_calls as f64
        } else {
            0.0
        };

        MetricsSummary {
            run_id: self.run_id.clone(),
            total_duration_ms: self.start_time.elapsed().as_millis() as u64,
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            escalations: self.escalations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            invocations,
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            avg_latency_ms: avg_latency,
        }
    }
}

impl MetricsSummary {
    /// Total gateway calls across tiers
    pub fn total_invocations(&self) -> u32 {
        self.invocations.iter().map(|(_, n)| n).sum()
    }

    /// Format summary for display
    pub fn display(&self) -> String {
        let per_tier = self
            .invocations
            .iter()
            .map(|(tier, n)| format!("{}: {}", tier, n))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Run: {}\n\
             Duration: {:.1}s\n\
             Requests: {} (cache hits: {}, escalations: {}, failures: {})\n\
             Invocations: {} ({})\n\
             Tokens: {} (input: {}, output: {})\n\
             Avg Latency: {:.0}ms",
            self.run_id,
            self.total_duration_ms as f64 / 1000.0,
            self.requests,
            self.cache_hits,
            self.escalations,
            self.failures,
            self.total_invocations(),
            per_tier,
            self.total_tokens,
            self.input_tokens,
            self.output_tokens,
            self.avg_latency_ms,
        )
    }
}

// =============================================================================
// Shared Type
// =============================================================================

/// Shared metrics collector
pub type SharedMetrics = Arc<RouterMetrics>;

/// Create shared metrics collector
pub fn create_shared_metrics(run_id: impl Into<String>) -> SharedMetrics {
    Arc::new(RouterMetrics::new(run_id))
}

// =============================================================================
// Tests
// =============================================================================
