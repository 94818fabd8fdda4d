//! Classify Command
//!
//! Show the tier a query would be routed to, without calling a model.

use crate::cli::ui::Output;
use crate::cli::{CommandContext, OutputFormat};
use crate::routing::QueryClassifier;
use crate::types::Result;

pub fn run(ctx: &CommandContext, query: &str, format: OutputFormat) -> Result<()> {
    let classifier = QueryClassifier::new(&ctx.config.routing);
    let trace = classifier.explain(query);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&trace)?),
        OutputFormat::Text => {
            let output = Output::new();
            let binding = ctx.config.models.binding(trace.tier);
            output.field("Tier", trace.tier);
            output.field("Model", &binding.model);
            output.field("Rule", &trace.rule);
            output.field("Length", format!("{} chars", trace.length));
        }
    }
    Ok(())
}
