//! Cache Command
//!
//! Usage:
//!   tierwise cache stats
//!   tierwise cache list [--limit N]
//!   tierwise cache clear

use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::cli::util::truncate;
use crate::types::Result;

pub fn stats(ctx: &CommandContext) -> Result<()> {
    let cache = ctx.open_cache()?;
    let stats = cache.stats();
    let output = Output::new();

    output.section("Cache");
    output.field("Backend", cache.backend_name());
    output.field("Enabled", cache.is_enabled());
    if cache.backend_name() != "memory" {
        output.field("Path", ctx.config.cache.resolved_path().display());
    }
    output.field("Entries", stats.count);
    output.field("Chars", stats.total_chars);

    if !stats.by_model.is_empty() {
        output.section("By Model");
        for (model, count) in &stats.by_model {
            output.field(model, count);
        }
    }
    if !stats.by_tier.is_empty() {
        output.section("By Tier");
        for (tier, count) in &stats.by_tier {
            output.field(tier.as_str(), count);
        }
    }
    Ok(())
}

pub fn list(ctx: &CommandContext, limit: usize) -> Result<()> {
    let cache = ctx.open_cache()?;
    let entries = cache.entries();
    let output = Output::new();

    if entries.is_empty() {
        output.info("Cache is empty");
        return Ok(());
    }

    for entry in entries.iter().take(limit) {
        println!(
            "{}  {:<8} {:<12} {}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.tier,
            entry.model,
            truncate(&entry.query, 60)
        );
    }
    if entries.len() > limit {
        output.info(&format!("… {} more", entries.len() - limit));
    }
    Ok(())
}

pub fn clear(ctx: &CommandContext) -> Result<()> {
    let cache = ctx.open_cache()?;
    let count = cache.len();
    cache.clear();
    Output::new().success(&format!("Cleared {} cache entries", count));
    Ok(())
}
