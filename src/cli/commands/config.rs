//! Config Command
//!
//! Manage tierwise configuration.
//!
//! Usage:
//!   tierwise config show [-f toml|json|yaml]
//!   tierwise config path
//!   tierwise config init [-g] [--force]

use std::path::Path;

use crate::config::{ConfigFormat, ConfigLoader};
use crate::types::Result;

/// Show the merged effective configuration
pub fn show(explicit: Option<&Path>, format: ConfigFormat) -> Result<()> {
    ConfigLoader::show_config(explicit, format)
}

/// Show configuration paths
pub fn path(explicit: Option<&Path>) -> Result<()> {
    ConfigLoader::show_path(explicit);
    Ok(())
}

/// Initialize global configuration
pub fn init_global(force: bool) -> Result<()> {
    let config_path = ConfigLoader::init_global(force)?;
    println!("✓ Initialized global configuration");
    println!("  Config: {}", config_path.display());
    Ok(())
}

/// Initialize project configuration
pub fn init_project(force: bool) -> Result<()> {
    let config_path = ConfigLoader::init_project(force)?;
    println!("✓ Initialized project configuration");
    println!("  Config: {}", config_path.display());
    Ok(())
}
