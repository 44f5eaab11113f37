//! Parallelism configuration for batch runs.
//!
//! Seeds are independent, so a batch fans out over rayon's thread pool with
//! one engine per worker.

use serde::{Deserialize, Serialize};

/// Default value for parallel processing enabled
fn default_enabled() -> bool {
    true
}

/// Default number of seeds handed to the pool at a time
fn default_batch_size() -> usize {
    256
}

/// Configuration for parallel seed processing.
///
/// # Example
///
/// ```rust
/// use aliquotmap::config::ParallelConfig;
///
/// let config = ParallelConfig {
///     enabled: true,
///     max_concurrency: Some(4),
///     batch_size: Some(64),
/// };
/// assert_eq!(config.effective_concurrency(), 4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Enable parallel processing (default: true)
    ///
    /// When disabled, seeds are run one after another on the calling thread.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum worker threads (default: available cores)
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Seeds per chunk (default: 256)
    ///
    /// Results are written and progress is reported after each chunk, so
    /// smaller chunks surface output sooner on long runs.
    #[serde(default = "default_batch_size_option")]
    pub batch_size: Option<usize>,
}

fn default_batch_size_option() -> Option<usize> {
    Some(default_batch_size())
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_concurrency: None,
            batch_size: Some(default_batch_size()),
        }
    }
}

impl ParallelConfig {
    /// Create a config with parallel processing disabled.
    pub fn sequential() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Get the effective concurrency level.
    ///
    /// Returns 1 when disabled, otherwise the configured max_concurrency or
    /// the number of available CPU cores.
    pub fn effective_concurrency(&self) -> usize {
        if !self.enabled {
            return 1;
        }
        self.max_concurrency.unwrap_or_else(num_cpus).max(1)
    }

    /// Get the effective batch size.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(default_batch_size())
    }
}

/// Returns the number of available CPU cores.
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}
