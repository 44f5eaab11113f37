//! Configuration for aliquotmap, read from `.aliquotmap.toml`.
//!
//! ```toml
//! [engine]
//! max_steps = 3000
//! prime_policy = "descend"
//!
//! [factor]
//! trial_limit = 20000
//! rng_seed = 12648430
//!
//! [parallel]
//! max_concurrency = 8
//! ```

mod core;
mod loader;
mod parallel;

pub use core::{AliquotConfig, FactorSettings, DEFAULT_RNG_SEED};
pub use loader::{
    directory_ancestors, discover_config, load_config, load_config_from,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
pub use parallel::ParallelConfig;
