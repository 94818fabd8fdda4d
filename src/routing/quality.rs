//! Response Quality Policy
//!
//! Decides whether a completion is good enough to return or should trigger
//! escalation. Checks run in order: error markers (case-sensitive), blank or
//! too-short text, then low-confidence phrases (case-insensitive).

use crate::config::QualityConfig;

/// Quality verdict for one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Acceptable,
    /// Backend embedded an error marker; never cached
    ErrorMarker(String),
    /// Trimmed text shorter than the minimum
    TooShort { chars: usize, min: usize },
    /// Response hedges with a low-confidence phrase
    LowConfidence(String),
}

impl Verdict {
    pub fn is_acceptable(&self) -> bool {
        matches!(self, Verdict::Acceptable)
    }

    /// Human-readable reason for a rejected response
    pub fn reason(&self) -> Option<String> {
        match self {
            Verdict::Acceptable => None,
            Verdict::ErrorMarker(marker) => Some(format!("error marker '{}'", marker)),
            Verdict::TooShort { chars, min } => Some(if *chars == 0 {
                "empty response".to_string()
            } else {
                format!("response too short ({} < {} chars)", chars, min)
            }),
            Verdict::LowConfidence(phrase) => Some(format!("low-confidence phrase '{}'", phrase)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QualityPolicy {
    error_markers: Vec<String>,
    low_confidence_phrases: Vec<String>,
    min_response_chars: usize,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self::new(&QualityConfig::default())
    }
}

impl QualityPolicy {
    pub fn new(config: &QualityConfig) -> Self {
        Self {
            error_markers: config
                .error_markers
                .iter()
                .filter(|m| !m.is_empty())
                .cloned()
                .collect(),
            low_confidence_phrases: config
                .low_confidence_phrases
                .iter()
                .map(|p| p.to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            min_response_chars: config.min_response_chars,
        }
    }

    pub fn assess(&self, text: &str) -> Verdict {
        if let Some(marker) = self.error_marker(text) {
            return Verdict::ErrorMarker(marker.to_string());
        }

        let chars = text.trim().chars().count();
        if chars < self.min_response_chars {
            return Verdict::TooShort {
                chars,
                min: self.min_response_chars,
            };
        }

        let lower = text.to_lowercase();
        if let Some(phrase) = self
            .low_confidence_phrases
            .iter()
            .find(|p| lower.contains(p.as_str()))
        {
            return Verdict::LowConfidence(phrase.clone());
        }

        Verdict::Acceptable
    }

    /// First configured error marker contained in `text`
    pub fn error_marker(&self, text: &str) -> Option<&str> {
        self.error_markers
            .iter()
            .find(|m| text.contains(m.as_str()))
            .map(String::as_str)
    }
}
