//! Routing result types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ComplexityTier, ErrorCategory};

/// How one gateway attempt ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Accepted,
    LowQuality { reason: String },
    Failed { category: ErrorCategory, message: String },
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::LowQuality { reason } => write!(f, "low quality ({})", reason),
            Self::Failed { category, message } => write!(f, "failed [{}] {}", category, message),
        }
    }
}

/// One step on the escalation ladder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub tier: ComplexityTier,
    pub model: String,
    pub outcome: AttemptOutcome,
    pub duration_ms: u64,
}

impl AttemptRecord {
    pub fn produced_text(&self) -> bool {
        !matches!(self.outcome, AttemptOutcome::Failed { .. })
    }
}

/// Overall result of routing one query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteOutcome {
    /// Served from the cache
    Cache,
    /// An attempt produced an acceptable answer
    Answered,
    /// Escalation exhausted; the last low-quality text was returned
    Degraded,
    /// Every attempt errored; the response describes the last error
    Failed,
}

impl fmt::Display for RouteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Answered => write!(f, "answered"),
            Self::Degraded => write!(f, "degraded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingResult {
    pub query: String,
    /// `"cache"` or `"<classified-tier> -> <final-model>"`
    pub route: String,
    pub response: String,
    pub cached: bool,
    /// Final model, or `"cached"` on a hit
    pub model: String,
    /// Wall-clock seconds
    pub execution_time: f64,
    pub classified_tier: Option<ComplexityTier>,
    pub final_tier: Option<ComplexityTier>,
    #[serde(default)]
    pub attempts: Vec<AttemptRecord>,
    pub outcome: RouteOutcome,
}

impl RoutingResult {
    /// Whether the final answer came from a higher tier than classified
    pub fn escalated(&self) -> bool {
        match (self.classified_tier, self.final_tier) {
            (Some(classified), Some(fin)) => fin > classified,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_outcome_display() {
        let failed = AttemptOutcome::Failed {
            category: ErrorCategory::Network,
            message: "refused".to_string(),
        };
        assert_eq!(failed.to_string(), "failed [NETWORK] refused");
    }

    #[test]
    fn test_attempt_outcome_serde_tag() {
        let json = serde_json::to_value(AttemptOutcome::LowQuality {
            reason: "empty response".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "low_quality");
        assert_eq!(json["reason"], "empty response");
    }

    #[test]
    fn test_escalated() {
        let mut result = RoutingResult {
            query: "q".to_string(),
            route: "simple -> mistral".to_string(),
            response: "a".to_string(),
            cached: false,
            model: "mistral".to_string(),
            execution_time: 0.1,
            classified_tier: Some(ComplexityTier::Simple),
            final_tier: Some(ComplexityTier::Medium),
            attempts: vec![],
            outcome: RouteOutcome::Answered,
        };
        assert!(result.escalated());
        result.final_tier = Some(ComplexityTier::Simple);
        assert!(!result.escalated());
        result.final_tier = None;
        assert!(!result.escalated());
    }
}
