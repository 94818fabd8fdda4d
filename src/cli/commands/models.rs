//! List tier bindings, optionally checking each backend.

use console::style;

use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::types::{ComplexityTier, Result};

pub async fn run(ctx: &CommandContext, check: bool) -> Result<()> {
    let output = Output::new();
    let gateway = if check { Some(ctx.gateway()?) } else { None };

    output.section("Models");
    for tier in ComplexityTier::ALL {
        let binding = ctx.config.models.binding(tier);
        let thinking = if binding.supports_thinking { " thinking" } else { "" };
        let mut line = format!(
            "{:<9} {:<14} {:<8} max_tokens={}{}",
            tier,
            binding.model,
            ctx.config.provider_for(tier),
            binding.max_tokens,
            thinking
        );

        if let Some(gateway) = &gateway {
            let status = if gateway.health_check(tier).await {
                style("ok").green().to_string()
            } else {
                style("unreachable").red().to_string()
            };
            line.push_str(&format!("  [{}]", status));
        }
        println!("  {}", line);
    }
    Ok(())
}
