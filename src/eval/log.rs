use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::routing::{RouteOutcome, RoutingResult};
use crate::types::{ComplexityTier, Result, ResultExt, RunId, TierError};

/// One routed query as recorded by `batch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub run_id: RunId,
    pub query: String,
    pub route: String,
    pub final_model: String,
    #[serde(default)]
    pub classified_tier: Option<ComplexityTier>,
    #[serde(default)]
    pub final_tier: Option<ComplexityTier>,
    pub was_cached: bool,
    #[serde(default)]
    pub escalated: bool,
    pub outcome: RouteOutcome,
    /// Seconds
    pub execution_time: f64,
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    pub fn from_result(run_id: &RunId, result: &RoutingResult) -> Self {
        Self {
            run_id: run_id.clone(),
            query: result.query.clone(),
            route: result.route.clone(),
            final_model: result.model.clone(),
            classified_tier: result.classified_tier,
            final_tier: result.final_tier,
            was_cached: result.cached,
            escalated: result.escalated(),
            outcome: result.outcome,
            execution_time: result.execution_time,
            timestamp: Utc::now(),
        }
    }
}

/// JSON array of `LogRecord`s on disk
pub struct EvaluationLog;

impl EvaluationLog {
    pub fn read(path: &Path) -> Result<Vec<LogRecord>> {
        if !path.exists() {
            return Err(TierError::Config(format!(
                "Log file not found at '{}'. Run `tierwise batch <FILE>` first.",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)?;
        let records = serde_json::from_str(&content)?;
        Ok(records)
    }

    pub fn write(path: &Path, records: &[LogRecord]) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(records)?;
        fs::write(path, content)
            .with_context_fn(|| format!("Failed to write evaluation log {}", path.display()))
    }
}
