//! Tracing subscriber setup.
//!
//! Logs always go to stderr so record output on stdout stays machine
//! readable. `RUST_LOG` takes precedence over the `-v` count.

use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count.
pub fn filter_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbosity)));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .with_thread_ids(verbosity >= 3)
        .with_line_number(verbosity >= 3)
        .try_init()
        .is_ok();

    if installed {
        debug!("aliquotmap started with verbosity level: {}", verbosity);
        trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
    }
}
