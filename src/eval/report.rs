use std::collections::BTreeMap;

use serde::Serialize;

use super::LogRecord;
use crate::routing::RouteOutcome;

/// Aggregate statistics over an evaluation log
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub total_queries: usize,
    /// Seconds
    pub total_time: f64,
    pub avg_time: f64,
    pub cached: usize,
    pub cache_hit_rate: f64,
    /// Final model -> query count
    pub model_usage: BTreeMap<String, usize>,
    /// Queries answered by a higher tier than classified
    pub escalations: usize,
    pub outcomes: BTreeMap<String, usize>,
}

impl EvaluationReport {
    pub fn from_records(records: &[LogRecord]) -> Self {
        let total_queries = records.len();
        if total_queries == 0 {
            return Self::default();
        }

        let total_time: f64 = records.iter().map(|r| r.execution_time).sum();
        let cached = records.iter().filter(|r| r.was_cached).count();

        let mut model_usage: BTreeMap<String, usize> = BTreeMap::new();
        let mut outcomes: BTreeMap<String, usize> = BTreeMap::new();
        for record in records {
            *model_usage.entry(record.final_model.clone()).or_default() += 1;
            *outcomes.entry(record.outcome.to_string()).or_default() += 1;
        }

        Self {
            total_queries,
            total_time,
            avg_time: total_time / total_queries as f64,
            cached,
            cache_hit_rate: cached as f64 / total_queries as f64 * 100.0,
            model_usage,
            escalations: records.iter().filter(|r| r.escalated).count(),
            outcomes,
        }
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .get(&RouteOutcome::Failed.to_string())
            .copied()
            .unwrap_or(0)
    }

    /// Format report for display
    pub fn display(&self) -> String {
        if self.total_queries == 0 {
            return "No queries recorded.".to_string();
        }

        let mut out = format!(
            "Total Queries: {}\n\
             Total Time: {:.2}s\n\
             Average Time: {:.2}s\n\
             \n\
             Cache\n\
             \x20 Served from cache: {} ({:.1}%)\n\
             \n\
             Model Usage\n",
            self.total_queries, self.total_time, self.avg_time, self.cached, self.cache_hit_rate,
        );

        for (model, count) in &self.model_usage {
            out.push_str(&format!("  {}: {}\n", model, count));
        }

        out.push_str(&format!("\nEscalations: {}\n\nOutcomes\n", self.escalations));
        for (outcome, count) in &self.outcomes {
            out.push_str(&format!("  {}: {}\n", outcome, count));
        }

        out.trim_end().to_string()
    }
}
