//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/tierwise/config.toml)
//! 3. Project config (.tierwise/config.toml)
//! 4. Explicit `--config` file
//! 5. Environment variables (TIERWISE_* prefix, `__` between sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, TierError};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TIERWISE_";

/// Output format for `config show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    #[default]
    Toml,
    Json,
    Yaml,
}

impl std::str::FromStr for ConfigFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "toml" | "text" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            _ => Err(format!(
                "Unknown config format: {}. Valid values: toml, json, yaml",
                s
            )),
        }
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        Self::load_with(None)
    }

    /// Load configuration, layering an explicit file above the project config
    pub fn load_with(explicit: Option<&Path>) -> Result<Config> {
        if let Some(path) = explicit
            && !path.exists()
        {
            return Err(TierError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        Self::load_from_sources(
            Self::global_config_path().as_deref(),
            &Self::project_config_path(),
            explicit,
            ENV_PREFIX,
        )
    }

    fn load_from_sources(
        global: Option<&Path>,
        project: &Path,
        explicit: Option<&Path>,
        env_prefix: &str,
    ) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if project.exists() {
            debug!("Loading project config from: {}", project.display());
            figment = figment.merge(Toml::file(project));
        }

        if let Some(path) = explicit {
            debug!("Loading config from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        // TIERWISE_FALLBACK__MAX_RETRIES -> fallback.max_retries
        figment = figment.merge(Env::prefixed(env_prefix).split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| TierError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| TierError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/tierwise/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".config"))
            })
            .map(|p| p.join("tierwise"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".tierwise")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path(explicit: Option<&Path>) {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());

        if let Some(path) = explicit {
            let exists = if path.exists() { "✓" } else { "✗" };
            println!("  Explicit: {} {}", exists, path.display());
        }
    }

    /// Render the effective configuration
    pub fn render_config(config: &Config, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Json => Ok(serde_json::to_string_pretty(config)?),
            ConfigFormat::Yaml => Ok(serde_yaml::to_string(config)?),
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| TierError::Config(e.to_string()))
            }
        }
    }

    /// Show current effective configuration
    pub fn show_config(explicit: Option<&Path>, format: ConfigFormat) -> Result<()> {
        let config = Self::load_with(explicit)?;
        println!("{}", Self::render_config(&config, format)?);
        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            TierError::Config("Cannot determine global config directory".to_string())
        })?;

        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_global_config())?;
            info!("Created global config: {}", config_path.display());
        } else {
            info!("Global config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Initialize project configuration
    pub fn init_project(force: bool) -> Result<PathBuf> {
        Self::init_project_in(&Self::project_dir(), force)
    }

    fn init_project_in(project_dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(project_dir)?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_project_config())?;
            info!("Created project config: {}", config_path.display());
        } else {
            info!("Project config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Generate default global config content (TOML)
    fn default_global_config() -> String {
        r#"# tierwise Global Configuration
# User-wide defaults. Project settings in .tierwise/config.toml override these.

version = "1.0"

[backend]
provider = "ollama"
# api_base = "http://localhost:11434"
timeout_secs = 120
temperature = 0.0

[models.simple]
model = "tinyllama"
max_tokens = 2048

[models.medium]
model = "mistral"
max_tokens = 4096

[models.advanced]
model = "llama3"
max_tokens = 8192
supports_thinking = true
"#
        .to_string()
    }

    /// Generate default project config content (TOML)
    fn default_project_config() -> String {
        r#"# tierwise Project Configuration
# Project-specific settings that override global defaults.

version = "1.0"

[routing]
max_simple_length = 60
max_medium_length = 250

[cache]
enabled = true
backend = "json"          # memory | json | sqlite
path = ".tierwise/cache.json"

[fallback]
enabled = true
max_retries = 2
on_exhausted = "degrade"  # degrade | fail
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheBackend, OnExhausted};
    use tempfile::TempDir;

    fn load_isolated(
        temp: &TempDir,
        explicit: Option<&Path>,
        env_prefix: &str,
    ) -> Result<Config> {
        ConfigLoader::load_from_sources(
            Some(&temp.path().join("global.toml")),
            &temp.path().join("project.toml"),
            explicit,
            env_prefix,
        )
    }

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_isolated(&temp, None, "TIERWISE_TEST_DEFAULTS_").unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.models.simple.model, "tinyllama");
    }

    #[test]
    fn test_project_overrides_global() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("global.toml"),
            "[models.simple]\nmodel = \"phi3\"\n[cache]\nbackend = \"sqlite\"\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("project.toml"),
            "[models.simple]\nmodel = \"gemma\"\n",
        )
        .unwrap();

        let config = load_isolated(&temp, None, "TIERWISE_TEST_LAYERS_").unwrap();
        assert_eq!(config.models.simple.model, "gemma");
        assert_eq!(config.cache.backend, CacheBackend::Sqlite);
        // Untouched fields keep their defaults
        assert_eq!(config.models.simple.max_tokens, 2048);
    }

    #[test]
    fn test_explicit_file_wins_over_project() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("project.toml"),
            "[fallback]\non_exhausted = \"degrade\"\n",
        )
        .unwrap();
        let explicit = temp.path().join("explicit.toml");
        fs::write(&explicit, "[fallback]\non_exhausted = \"fail\"\n").unwrap();

        let config = load_isolated(&temp, Some(&explicit), "TIERWISE_TEST_EXPLICIT_").unwrap();
        assert_eq!(config.fallback.on_exhausted, OnExhausted::Fail);
    }

    #[test]
    fn test_env_override() {
        let temp = TempDir::new().unwrap();
        // SAFETY: prefix is unique to this test
        unsafe {
            std::env::set_var("TIERWISE_TEST_ENV_FALLBACK__MAX_RETRIES", "1");
            std::env::set_var("TIERWISE_TEST_ENV_MODELS__MEDIUM__MODEL", "qwen2");
        }
        let config = load_isolated(&temp, None, "TIERWISE_TEST_ENV_").unwrap();
        unsafe {
            std::env::remove_var("TIERWISE_TEST_ENV_FALLBACK__MAX_RETRIES");
            std::env::remove_var("TIERWISE_TEST_ENV_MODELS__MEDIUM__MODEL");
        }
        assert_eq!(config.fallback.max_retries, 1);
        assert_eq!(config.models.medium.model, "qwen2");
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("project.toml"),
            "[routing]\nmax_simple_length = 500\nmax_medium_length = 100\n",
        )
        .unwrap();
        let err = load_isolated(&temp, None, "TIERWISE_TEST_INVALID_").unwrap_err();
        assert!(matches!(err, TierError::Config(_)));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigLoader::load_with(Some(Path::new("/nonexistent/tierwise.toml")))
            .unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_default_templates_parse() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        fs::write(&global, ConfigLoader::default_global_config()).unwrap();
        assert!(ConfigLoader::load_from_file(&global).is_ok());

        let project = ConfigLoader::init_project_in(&temp.path().join(".tierwise"), false).unwrap();
        let config = ConfigLoader::load_from_file(&project).unwrap();
        assert_eq!(config.cache.resolved_path(), PathBuf::from(".tierwise/cache.json"));
    }

    #[test]
    fn test_render_formats() {
        let config = Config::default();
        let toml = ConfigLoader::render_config(&config, ConfigFormat::Toml).unwrap();
        assert!(toml.contains("[backend]"));
        let json = ConfigLoader::render_config(&config, ConfigFormat::Json).unwrap();
        assert!(json.contains("\"max_retries\": 2"));
        let yaml = ConfigLoader::render_config(&config, ConfigFormat::Yaml).unwrap();
        assert!(yaml.contains("on_exhausted: degrade"));
    }
}
