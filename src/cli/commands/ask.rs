//! Ask Command
//!
//! Route one query and print the result.
//!
//! Usage:
//!   tierwise ask "what is the capital of France?" [--no-cache] [-f json]

use crate::cli::ui::Output;
use crate::cli::{CommandContext, OutputFormat};
use crate::types::Result;

pub async fn run(ctx: &CommandContext, query: &str, use_cache: bool, format: OutputFormat) -> Result<()> {
    let router = ctx.router(None)?;
    let result = router.route(query, use_cache).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => Output::new().routing_result(&result),
    }
    Ok(())
}
