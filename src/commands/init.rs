use crate::config::CONFIG_FILE_NAME;
use crate::io;
use anyhow::Result;
use std::path::Path;

pub const DEFAULT_CONFIG: &str = r#"# aliquotmap configuration

[engine]
# Step budget for `run` when --steps is not given
max_steps = 3000
# "descend" iterates down to 1; "stop-at-prime" ends at the first prime
prime_policy = "descend"

[factor]
# Trial division bound after the small primes (0 disables)
trial_limit = 20000
# Give up on a factorization after this many Pollard rho restarts
# max_restarts = 1000
# Base seed for per-record random streams
rng_seed = 12648430

[parallel]
enabled = true
# max_concurrency = 8
batch_size = 256
"#;

pub fn init_config(force: bool) -> Result<()> {
    init_config_in(Path::new("."), force)?;
    println!("Created {} configuration file", CONFIG_FILE_NAME);
    Ok(())
}

/// Write the default config into `dir`.
pub fn init_config_in(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    io::write_file(&config_path, DEFAULT_CONFIG)?;
    Ok(())
}
