pub mod error;
pub mod tier;

pub use error::{
    ErrorCategory, ErrorClassifier, LlmError, ModelInvocationError, Result, ResultExt, TierError,
};
pub use tier::ComplexityTier;

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Type-safe wrapper for evaluation run IDs
///
/// Groups every log record written by one `batch` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random run identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod newtype_tests {
    use super::*;

    #[test]
    fn test_run_id() {
        let id = RunId::new("run-1");
        assert_eq!(id.as_str(), "run-1");
        assert_eq!(format!("{}", id), "run-1");
        assert_ne!(RunId::generate(), RunId::generate());
    }

    #[test]
    fn test_run_id_serializes_as_string() {
        let json = serde_json::to_string(&RunId::from("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
