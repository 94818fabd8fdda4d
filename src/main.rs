use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tierwise::cli::commands;
use tierwise::cli::{CommandContext, OutputFormat};
use tierwise::config::ConfigFormat;
use tierwise::constants::eval;

/// Parse output format from string
fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    s.parse().map_err(|e: tierwise::TierError| e.to_string())
}

/// Parse config format from string
fn parse_config_format(s: &str) -> Result<ConfigFormat, String> {
    s.parse()
}

#[derive(Parser)]
#[command(name = "tierwise")]
#[command(
    version,
    about = "Complexity-aware query router for tiered LLM backends"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Additional config file (highest file priority)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Route a single query
    Ask {
        #[arg(help = "Query text")]
        query: String,
        #[arg(long, help = "Neither read nor write the response cache")]
        no_cache: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            value_parser = parse_output_format,
            help = "Output format: text, json"
        )]
        format: OutputFormat,
    },

    /// Interactive query loop
    Repl {
        #[arg(long, help = "Neither read nor write the response cache")]
        no_cache: bool,
    },

    /// Show the tier a query would be routed to (no model call)
    Classify {
        #[arg(help = "Query text")]
        query: String,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            value_parser = parse_output_format,
            help = "Output format: text, json"
        )]
        format: OutputFormat,
    },

    /// Route every line of a file and write an evaluation log
    Batch {
        #[arg(help = "File with one query per line")]
        file: PathBuf,
        #[arg(long, default_value = eval::DEFAULT_LOG_PATH, help = "Evaluation log output path")]
        log: PathBuf,
        #[arg(long, default_value_t = eval::DEFAULT_BATCH_CONCURRENCY, help = "Queries routed concurrently")]
        concurrency: usize,
        #[arg(long, help = "Neither read nor write the response cache")]
        no_cache: bool,
    },

    /// Summarize an evaluation log
    Analyze {
        #[arg(default_value = eval::DEFAULT_LOG_PATH, help = "Evaluation log path")]
        log: PathBuf,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            value_parser = parse_output_format,
            help = "Output format: text, json"
        )]
        format: OutputFormat,
    },

    /// Inspect or clear the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// List tier model bindings
    Models {
        #[arg(long, help = "Run a health check against each backend")]
        check: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Entry counts by model and tier
    Stats,
    /// Newest entries first
    List {
        #[arg(long, short = 'n', default_value = "20", help = "Maximum entries to show")]
        limit: usize,
    },
    /// Remove every entry
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            value_parser = parse_config_format,
            help = "Output format: toml, json, yaml"
        )]
        format: ConfigFormat,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mtierwise encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let explicit = cli.config.as_deref();

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(explicit, format)?,
            ConfigAction::Path => commands::config::path(explicit)?,
            ConfigAction::Init { global, force } => {
                if global {
                    commands::config::init_global(force)?;
                } else {
                    commands::config::init_project(force)?;
                }
            }
        },
        Commands::Analyze { log, format } => {
            commands::analyze::run(&log, format)?;
        }
        command => {
            let ctx = CommandContext::load(explicit)?;
            run_with_context(&ctx, command)?;
        }
    }

    Ok(())
}

fn run_with_context(ctx: &CommandContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Ask {
            query,
            no_cache,
            format,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::ask::run(ctx, &query, !no_cache, format))?;
        }
        Commands::Repl { no_cache } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::repl::run(ctx, !no_cache))?;
        }
        Commands::Classify { query, format } => {
            commands::classify::run(ctx, &query, format)?;
        }
        Commands::Batch {
            file,
            log,
            concurrency,
            no_cache,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::batch::run(ctx, &file, &log, concurrency, !no_cache))?;
        }
        Commands::Cache { action } => match action {
            CacheAction::Stats => commands::cache::stats(ctx)?,
            CacheAction::List { limit } => commands::cache::list(ctx, limit)?,
            CacheAction::Clear => commands::cache::clear(ctx)?,
        },
        Commands::Models { check } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::models::run(ctx, check))?;
        }
        Commands::Config { .. } | Commands::Analyze { .. } => {}
    }
    Ok(())
}
