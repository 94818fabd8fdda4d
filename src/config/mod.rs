//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/tierwise/config.toml)
//! 3. Project config (.tierwise/config.toml)
//! 4. Explicit `--config` file
//! 5. Environment variables (TIERWISE_*)

mod loader;
mod types;

pub use loader::{ConfigFormat, ConfigLoader, ENV_PREFIX};
pub use types::*;
