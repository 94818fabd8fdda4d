//! CLI Common Utilities
//!
//! Shared initialization for command handlers: configuration, cache,
//! gateway and router are built here once per invocation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::ai::{ModelGateway, SharedMetrics, TierGateway};
use crate::cache::ResponseCache;
use crate::config::{Config, ConfigLoader};
use crate::routing::QueryRouter;
use crate::types::{Result, TierError};

/// Output format for commands that print results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(TierError::Config(format!(
                "Invalid format '{}'. Valid values: text, json",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Command execution context
///
/// Holds the validated configuration and the explicit `--config` path so
/// subcommands can build only the resources they need.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = ConfigLoader::load_with(config_path)?;
        Ok(Self::from_config(config, config_path.map(Path::to_path_buf)))
    }

    pub fn from_config(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Open the configured response cache
    pub fn open_cache(&self) -> Result<Arc<ResponseCache>> {
        Ok(Arc::new(ResponseCache::from_config(&self.config.cache)?))
    }

    /// Build the tier gateway from configuration
    pub fn gateway(&self) -> Result<Arc<dyn ModelGateway>> {
        Ok(Arc::new(TierGateway::from_config(&self.config)?))
    }

    /// Cache, gateway and router wired together
    pub fn router(&self, metrics: Option<SharedMetrics>) -> Result<Arc<QueryRouter>> {
        let router = QueryRouter::new(&self.config, self.open_cache()?, self.gateway()?);
        Ok(Arc::new(match metrics {
            Some(metrics) => router.with_metrics(metrics),
            None => router,
        }))
    }
}

/// Shorten text to `max` characters for one-line listings
pub fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let cut: String = single_line.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}
