//! Query Router
//!
//! Cache check, classification, then a bounded walk up the tier ladder:
//!
//! ```text
//! CacheCheck ─hit──────────────────────────────────────────▶ Done(cache)
//!     │ miss
//!     ▼
//! Classify ─▶ Invoke(tier) ─acceptable──────────────────────▶ Done
//!                 │ failed / low quality
//!                 ├─ escalations < max_retries && tier.next() ─▶ Invoke(next)
//!                 └─ otherwise ─▶ Exhausted (degrade | fail)
//! ```
//!
//! The ladder never moves down, and at most `max_retries` escalations
//! happen per query (two steps exist).

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use super::classifier::QueryClassifier;
use super::quality::QualityPolicy;
use super::result::{AttemptOutcome, AttemptRecord, RouteOutcome, RoutingResult};
use crate::ai::{ModelGateway, SharedMetrics};
use crate::cache::ResponseCache;
use crate::config::{Config, FallbackConfig, OnExhausted};
use crate::constants::cache::{CACHE_ROUTE, CACHED_MODEL};
use crate::types::{ComplexityTier, Result, TierError};

/// Text produced by some attempt, kept for the degrade policy
struct Produced {
    text: String,
    tier: ComplexityTier,
    model: String,
}

/// Routes queries through cache, classifier and gateway
pub struct QueryRouter {
    classifier: QueryClassifier,
    quality: QualityPolicy,
    fallback: FallbackConfig,
    cache: Arc<ResponseCache>,
    gateway: Arc<dyn ModelGateway>,
    metrics: Option<SharedMetrics>,
}

impl QueryRouter {
    pub fn new(config: &Config, cache: Arc<ResponseCache>, gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            classifier: QueryClassifier::new(&config.routing),
            quality: QualityPolicy::new(&config.fallback.quality),
            fallback: config.fallback.clone(),
            cache,
            gateway,
            metrics: None,
        }
    }

    /// Cache write on the blocking pool; stores do synchronous file I/O
    async fn store_in_cache(&self, query: &str, response: &str, model: &str, tier: ComplexityTier) {
        let cache = Arc::clone(&self.cache);
        let (query, response, model) = (query.to_string(), response.to_string(), model.to_string());
        let write = tokio::task::spawn_blocking(move || cache.set(&query, &response, &model, tier));
        if let Err(e) = write.await {
            warn!("Cache write task failed: {}", e);
        }
    }

    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn classifier(&self) -> &QueryClassifier {
        &self.classifier
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Route with the cache in play
    pub async fn route_default(&self, query: &str) -> Result<RoutingResult> {
        self.route(query, true).await
    }

    /// Route one query; `use_cache = false` neither reads nor writes the cache
    #[instrument(skip(self, query), fields(chars = query.chars().count()))]
    pub async fn route(&self, query: &str, use_cache: bool) -> Result<RoutingResult> {
        let start = Instant::now();
        self.metric(|m| m.record_request());

        let caching = use_cache && self.cache.is_enabled();

        if caching && let Some(entry) = self.cache.get(query) {
            self.metric(|m| m.record_cache_hit());
            debug!(model = %entry.model, "Cache hit");
            return Ok(RoutingResult {
                query: query.to_string(),
                route: CACHE_ROUTE.to_string(),
                response: entry.response,
                cached: true,
                model: CACHED_MODEL.to_string(),
                execution_time: start.elapsed().as_secs_f64(),
                classified_tier: None,
                final_tier: Some(entry.tier),
                attempts: Vec::new(),
                outcome: RouteOutcome::Cache,
            });
        }

        let trace = self.classifier.explain(query);
        let classified = trace.tier;
        debug!(tier = %classified, rule = %trace.rule, "Classified query");

        let mut tier = classified;
        let mut escalations: u8 = 0;
        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut produced: Option<Produced> = None;
        let mut last_error: Option<(String, String)> = None;

        loop {
            let attempt_start = Instant::now();
            let model = self.gateway.binding(tier).model.clone();

            let outcome = match self.gateway.generate(tier, query).await {
                Ok(completion) => {
                    self.metric(|m| {
                        m.record_invocation(tier, &completion.usage, completion.latency_ms)
                    });
                    let verdict = self.quality.assess(&completion.text);
                    let outcome = match verdict.reason() {
                        None => AttemptOutcome::Accepted,
                        Some(reason) => AttemptOutcome::LowQuality { reason },
                    };
                    // Blank or error-marked text never displaces usable text
                    let usable = !completion.text.trim().is_empty()
                        && self.quality.error_marker(&completion.text).is_none();
                    if usable || produced.is_none() {
                        produced = Some(Produced {
                            text: completion.text,
                            tier,
                            model: completion.model,
                        });
                    }
                    outcome
                }
                Err(err) => {
                    let latency = attempt_start.elapsed().as_millis() as u64;
                    self.metric(|m| m.record_invocation(tier, &Default::default(), latency));
                    last_error = Some((err.model.clone(), err.message.clone()));
                    AttemptOutcome::Failed {
                        category: err.category,
                        message: err.message,
                    }
                }
            };

            let accepted = outcome == AttemptOutcome::Accepted;
            attempts.push(AttemptRecord {
                tier,
                model,
                outcome,
                duration_ms: attempt_start.elapsed().as_millis() as u64,
            });

            if accepted {
                break;
            }

            match self.next_tier(tier, escalations) {
                Some(next) => {
                    escalations += 1;
                    self.metric(|m| m.record_escalation());
                    if let Some(last) = attempts.last() {
                        info!(
                            from = %tier,
                            to = %next,
                            model = %last.model,
                            "Escalating: {}",
                            last.outcome
                        );
                    }
                    tier = next;
                }
                None => break,
            }
        }

        let accepted = attempts
            .last()
            .is_some_and(|a| a.outcome == AttemptOutcome::Accepted);

        if !accepted && self.fallback.on_exhausted == OnExhausted::Fail {
            self.metric(|m| m.record_failure());
            warn!(attempts = attempts.len(), "Escalation exhausted");
            return Err(TierError::ExhaustedEscalation {
                query: query.to_string(),
                attempts,
            });
        }

        let (response, final_model, final_tier, outcome) = match produced {
            Some(p) => {
                let outcome = if accepted {
                    RouteOutcome::Answered
                } else {
                    RouteOutcome::Degraded
                };
                (p.text, p.model, Some(p.tier), outcome)
            }
            None => {
                let (model, cause) = last_error.unwrap_or_else(|| {
                    (self.gateway.binding(tier).model.clone(), "no attempt made".to_string())
                });
                self.metric(|m| m.record_failure());
                warn!(model = %model, "All tiers failed: {}", cause);
                (
                    format!("Fallback failed. Last error with {}: {}", model, cause),
                    model,
                    Some(tier),
                    RouteOutcome::Failed,
                )
            }
        };

        if outcome == RouteOutcome::Degraded {
            warn!(model = %final_model, "Returning degraded response");
        }

        if caching
            && outcome != RouteOutcome::Failed
            && let Some(final_tier) = final_tier
        {
            match self.quality.error_marker(&response) {
                Some(marker) => debug!(marker, "Not caching response with error marker"),
                None => self.store_in_cache(query, &response, &final_model, final_tier).await,
            }
        }

        let result = RoutingResult {
            query: query.to_string(),
            route: format!("{} -> {}", classified, final_model),
            response,
            cached: false,
            model: final_model,
            execution_time: start.elapsed().as_secs_f64(),
            classified_tier: Some(classified),
            final_tier,
            attempts,
            outcome,
        };

        info!(
            route = %result.route,
            outcome = %result.outcome,
            attempts = result.attempts.len(),
            "Routed query in {:.2}s",
            result.execution_time
        );

        Ok(result)
    }

    /// Next rung, if escalation is allowed from `tier` after `escalations` steps
    fn next_tier(&self, tier: ComplexityTier, escalations: u8) -> Option<ComplexityTier> {
        if !self.fallback.enabled || escalations >= self.fallback.max_retries {
            return None;
        }
        tier.next()
    }

    fn metric(&self, f: impl FnOnce(&crate::ai::RouterMetrics)) {
        if let Some(metrics) = &self.metrics {
            f(metrics);
        }
    }
}
