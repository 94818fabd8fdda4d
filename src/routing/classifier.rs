//! Query Complexity Classification
//!
//! Sorts a query into Simple, Medium or Advanced using length bands,
//! a leading-question pattern and keyword lists. Pure and deterministic:
//! no model call, no I/O.
//!
//! ## Rules (first match wins)
//!
//! 1. Short (≤ `max_simple_length`) and starts with a question word → Simple
//! 2. Medium band (≤ `max_medium_length`) with a complex keyword → Advanced
//! 3. Medium band with a simple keyword → Medium
//! 4. Medium band otherwise → Medium
//! 5. Longer than the medium band → Advanced

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use crate::config::RoutingConfig;
use crate::constants::routing::SIMPLE_FACTUAL_PATTERN;
use crate::types::ComplexityTier;

static SIMPLE_FACTUAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SIMPLE_FACTUAL_PATTERN).expect("valid question-word pattern"));

/// Rule that decided a classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "keyword", rename_all = "snake_case")]
pub enum ClassificationRule {
    /// Short query starting with a question word
    SimpleFactual,
    /// Medium-band query containing a complex keyword
    ComplexKeyword(String),
    /// Medium-band query containing a simple keyword
    SimpleKeyword(String),
    /// Medium-band query with no keyword
    MediumDefault,
    /// Query longer than the medium band
    LongQuery,
}

impl fmt::Display for ClassificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SimpleFactual => write!(f, "simple factual question"),
            Self::ComplexKeyword(k) => write!(f, "complex keyword '{}'", k),
            Self::SimpleKeyword(k) => write!(f, "simple keyword '{}'", k),
            Self::MediumDefault => write!(f, "medium-length default"),
            Self::LongQuery => write!(f, "long query"),
        }
    }
}

/// Classification outcome with the rule that fired
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationTrace {
    pub tier: ComplexityTier,
    pub rule: ClassificationRule,
    /// Query length in characters
    pub length: usize,
}

/// Heuristic classifier over configured thresholds and keywords
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    max_simple_length: usize,
    max_medium_length: usize,
    complex_keywords: Vec<String>,
    simple_keywords: Vec<String>,
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new(&RoutingConfig::default())
    }
}

impl QueryClassifier {
    pub fn new(config: &RoutingConfig) -> Self {
        let lower = |keywords: &[String]| {
            keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };
        Self {
            max_simple_length: config.max_simple_length,
            max_medium_length: config.max_medium_length,
            complex_keywords: lower(&config.complex_keywords),
            simple_keywords: lower(&config.simple_keywords),
        }
    }

    /// Tier for a query
    pub fn classify(&self, query: &str) -> ComplexityTier {
        self.explain(query).tier
    }

    /// Tier plus the rule that produced it
    pub fn explain(&self, query: &str) -> ClassificationTrace {
        let length = query.chars().count();
        let trace = |tier, rule| ClassificationTrace { tier, rule, length };

        if length <= self.max_simple_length && SIMPLE_FACTUAL.is_match(query) {
            return trace(ComplexityTier::Simple, ClassificationRule::SimpleFactual);
        }

        if length > self.max_medium_length {
            return trace(ComplexityTier::Advanced, ClassificationRule::LongQuery);
        }

        let lower = query.to_lowercase();

        if let Some(keyword) = self.complex_keywords.iter().find(|k| lower.contains(k.as_str())) {
            return trace(
                ComplexityTier::Advanced,
                ClassificationRule::ComplexKeyword(keyword.clone()),
            );
        }

        if let Some(keyword) = self.simple_keywords.iter().find(|k| lower.contains(k.as_str())) {
            return trace(
                ComplexityTier::Medium,
                ClassificationRule::SimpleKeyword(keyword.clone()),
            );
        }

        trace(ComplexityTier::Medium, ClassificationRule::MediumDefault)
    }
}
