//! Progress feedback for batch runs.
//!
//! - **Quiet Mode**: No progress output (respects `ALIQUOTMAP_QUIET` and `--quiet`)
//! - **Non-TTY**: Progress bars are hidden in CI and when stderr is piped
//!
//! ```rust,no_run
//! use aliquotmap::progress::{ProgressConfig, ProgressManager, TEMPLATE_SEEDS};
//!
//! let manager = ProgressManager::new(ProgressConfig::from_env(false, 0));
//! let bar = manager.create_bar(100, TEMPLATE_SEEDS);
//! bar.set_message("Iterating");
//! for _ in 0..100 {
//!     bar.inc(1);
//! }
//! bar.finish_and_clear();
//! ```

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;

/// Environment variable that silences progress output.
pub const QUIET_ENV_VAR: &str = "ALIQUOTMAP_QUIET";

pub const TEMPLATE_SEEDS: &str =
    "{msg} {bar:30} {pos}/{len} seeds ({percent}%) - {per_sec} - {eta}";
pub const TEMPLATE_SPINNER: &str = "{spinner} {msg}";

/// Configuration for progress display behavior
#[derive(Debug, Clone, Default)]
pub struct ProgressConfig {
    /// Whether to suppress all progress output
    pub quiet_mode: bool,
    /// Verbosity level from `-v`
    pub verbosity: u8,
}

impl ProgressConfig {
    /// Create progress configuration from environment and CLI arguments
    pub fn from_env(quiet: bool, verbosity: u8) -> Self {
        let env_quiet = std::env::var_os(QUIET_ENV_VAR).is_some();
        Self {
            quiet_mode: quiet || env_quiet,
            verbosity,
        }
    }

    /// Determine if progress bars should be displayed
    ///
    /// Bars stay hidden from `-vv` on, where debug logs share stderr.
    pub fn should_show_progress(&self) -> bool {
        if self.quiet_mode || self.verbosity >= 2 {
            return false;
        }

        use std::io::IsTerminal;
        std::io::stderr().is_terminal()
    }
}

/// Hands out progress bars that all draw to one stderr region.
#[derive(Clone)]
pub struct ProgressManager {
    multi: Arc<MultiProgress>,
    config: ProgressConfig,
}

impl ProgressManager {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            multi: Arc::new(MultiProgress::new()),
            config,
        }
    }

    /// Create a progress bar, or a hidden one when progress is suppressed.
    pub fn create_bar(&self, len: u64, template: &str) -> ProgressBar {
        if !self.config.should_show_progress() {
            return ProgressBar::hidden();
        }

        let style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        let pb = self.multi.add(ProgressBar::new(len));
        pb.set_style(style);
        pb
    }

    /// Create a ticking spinner, or a hidden one when progress is suppressed.
    pub fn create_spinner(&self, msg: &str) -> ProgressBar {
        if !self.config.should_show_progress() {
            return ProgressBar::hidden();
        }

        let style = ProgressStyle::default_spinner()
            .template(TEMPLATE_SPINNER)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(style);
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
