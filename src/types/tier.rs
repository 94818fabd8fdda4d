//! Complexity Tiers
//!
//! The ordered ladder of backend tiers a query can be dispatched to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::TierError;

/// Estimated query complexity, ordered cheapest first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Simple,
    Medium,
    Advanced,
}

impl ComplexityTier {
    /// Escalation ladder in order
    pub const ALL: [ComplexityTier; 3] = [Self::Simple, Self::Medium, Self::Advanced];

    /// Next higher tier, `None` at the top of the ladder
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Simple => Some(Self::Medium),
            Self::Medium => Some(Self::Advanced),
            Self::Advanced => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplexityTier {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "medium" => Ok(Self::Medium),
            "advanced" => Ok(Self::Advanced),
            other => Err(TierError::Config(format!(
                "Unknown tier '{}'. Expected one of: simple, medium, advanced",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(ComplexityTier::Simple < ComplexityTier::Medium);
        assert!(ComplexityTier::Medium < ComplexityTier::Advanced);
    }

    #[test]
    fn test_next_walks_upward_and_stops() {
        assert_eq!(ComplexityTier::Simple.next(), Some(ComplexityTier::Medium));
        assert_eq!(ComplexityTier::Medium.next(), Some(ComplexityTier::Advanced));
        assert_eq!(ComplexityTier::Advanced.next(), None);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("SIMPLE".parse::<ComplexityTier>().ok(), Some(ComplexityTier::Simple));
        assert_eq!(" Advanced ".parse::<ComplexityTier>().ok(), Some(ComplexityTier::Advanced));
        assert!("expert".parse::<ComplexityTier>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ComplexityTier::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        let tier: ComplexityTier = serde_json::from_str("\"advanced\"").unwrap();
        assert_eq!(tier, ComplexityTier::Advanced);
    }
}
