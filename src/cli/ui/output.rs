use console::style;

use crate::routing::{RouteOutcome, RoutingResult};

/// Styled terminal output for command handlers
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Aligned `label: value` line
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!("  {:<10} {}", style(format!("{}:", label)).dim(), value);
    }

    /// Route summary followed by the response text
    pub fn routing_result(&self, result: &RoutingResult) {
        self.section("Result");
        self.field("Route", &result.route);
        self.field("Model", &result.model);
        self.field("Cached", result.cached);
        self.field("Time", format!("{:.2}s", result.execution_time));

        let outcome = match result.outcome {
            RouteOutcome::Degraded => style(result.outcome.to_string()).yellow(),
            RouteOutcome::Failed => style(result.outcome.to_string()).red(),
            _ => style(result.outcome.to_string()).green(),
        };
        self.field("Outcome", outcome);

        if result.attempts.len() > 1 {
            for attempt in &result.attempts {
                println!(
                    "    {} {} ({}ms): {}",
                    style("↳").dim(),
                    attempt.tier,
                    attempt.duration_ms,
                    attempt.outcome
                );
            }
        }

        println!("\n{}\n", result.response);
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
