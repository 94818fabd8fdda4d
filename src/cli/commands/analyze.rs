//! Summarize an evaluation log written by `batch`.

use std::path::Path;

use crate::cli::OutputFormat;
use crate::cli::ui::Output;
use crate::eval::{EvaluationLog, EvaluationReport};
use crate::types::Result;

pub fn run(log: &Path, format: OutputFormat) -> Result<()> {
    let records = EvaluationLog::read(log)?;
    let report = EvaluationReport::from_records(&records);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            Output::new().header("Routing Analysis");
            println!("{}", report.display());
        }
    }
    Ok(())
}
