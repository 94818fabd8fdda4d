//! Batch Command
//!
//! Route every non-empty line of a file and write an evaluation log.
//!
//! Usage:
//!   tierwise batch queries.txt [--log evaluation_log.json] [--concurrency 4] [--no-cache]

use std::path::Path;

use futures::stream::{self, StreamExt};
use tracing::info;

use crate::ai::create_shared_metrics;
use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::cli::util::truncate;
use crate::eval::{EvaluationLog, LogRecord};
use crate::types::{Result, RunId, TierError};

/// Trimmed, non-empty lines of a query file
pub fn read_queries(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        TierError::Config(format!("Cannot read query file {}: {}", path.display(), e))
    })?;
    Ok(parse_queries(&content))
}

fn parse_queries(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

pub async fn run(
    ctx: &CommandContext,
    file: &Path,
    log: &Path,
    concurrency: usize,
    use_cache: bool,
) -> Result<()> {
    let output = Output::new();
    let queries = read_queries(file)?;
    if queries.is_empty() {
        output.warning(&format!("No queries found in {}", file.display()));
        return Ok(());
    }

    let run_id = RunId::generate();
    let metrics = create_shared_metrics(run_id.as_str());
    let router = ctx.router(Some(metrics.clone()))?;
    let concurrency = concurrency.max(1);

    info!(run_id = %run_id, queries = queries.len(), concurrency, "Starting batch");
    output.header(&format!("Routing {} queries", queries.len()));

    // `buffered` keeps results in input order
    let results: Vec<_> = stream::iter(queries.iter())
        .map(|query| {
            let router = router.clone();
            async move { (query, router.route(query, use_cache).await) }
        })
        .buffered(concurrency)
        .collect()
        .await;

    let mut records = Vec::with_capacity(results.len());
    let mut errors = 0usize;
    for (query, result) in results {
        match result {
            Ok(result) => {
                output.success(&format!(
                    "{} → {} ({:.2}s)",
                    truncate(query, 50),
                    result.route,
                    result.execution_time
                ));
                records.push(LogRecord::from_result(&run_id, &result));
            }
            Err(e) => {
                errors += 1;
                output.error(&format!("{}: {}", truncate(query, 50), e));
            }
        }
    }

    EvaluationLog::write(log, &records)?;

    output.section("Summary");
    println!("{}", metrics.snapshot().display());
    if errors > 0 {
        output.warning(&format!("{} queries failed and were not logged", errors));
    }
    output.success(&format!("Wrote {} records to {}", records.len(), log.display()));
    Ok(())
}
