//! Unified Timeout Configuration
//!
//! Per-operation deadlines for gateway calls and a helper for wrapping
//! async operations with a consistent timeout error.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::ai::timeout::{TimeoutConfig, with_timeout};
//!
//! let config = TimeoutConfig::from_config(&config);
//! let result = with_timeout(
//!     config.invocation,
//!     async { /* provider call */ },
//!     "simple tier (tinyllama)"
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::config::Config;
use crate::constants::network as net_constants;
use crate::types::{Result, TierError};

/// Deadlines for gateway operations
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Deadline for one model invocation (default: 120 seconds)
    pub invocation: Duration,
    /// Deadline for a provider health check (default: 10 seconds)
    pub health_check: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            invocation: Duration::from_secs(net_constants::DEFAULT_TIMEOUT_SECS),
            health_check: Duration::from_secs(net_constants::HEALTH_CHECK_TIMEOUT_SECS),
        }
    }
}

impl TimeoutConfig {
    /// Deadlines taken from `backend.timeout_secs`
    pub fn from_config(config: &Config) -> Self {
        Self {
            invocation: Duration::from_secs(config.backend.timeout_secs),
            ..Self::default()
        }
    }
}

/// Execute an async operation with a timeout
///
/// Returns a timeout error if the operation doesn't complete within the specified duration.
///
/// # Arguments
///
/// * `timeout` - Maximum duration to wait
/// * `future` - The async operation to execute
/// * `operation_name` - Description of the operation (for error messages)
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(TierError::timeout(operation_name, timeout)),
    }
}
