//! Interactive query loop. `exit` or end of input quits.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::ai::create_shared_metrics;
use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::types::{Result, RunId};

pub async fn run(ctx: &CommandContext, use_cache: bool) -> Result<()> {
    let output = Output::new();
    let metrics = create_shared_metrics(RunId::generate().as_str());
    let router = ctx.router(Some(metrics.clone()))?;

    output.header("tierwise");
    output.info("Enter a query (type 'exit' to quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("Query: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let query = line.trim();

        if query.eq_ignore_ascii_case("exit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        match router.route(query, use_cache).await {
            Ok(result) => output.routing_result(&result),
            Err(e) => output.error(&e.to_string()),
        }
    }

    let summary = metrics.snapshot();
    if summary.requests > 0 {
        output.section("Session");
        println!("{}", summary.display());
    }
    Ok(())
}
