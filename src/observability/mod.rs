//! Crash reports and run context.
//!
//! - **Panic Hook**: Produces structured crash reports with context
//! - **Context Tracking**: Thread-local run phase, seed and input line
//! - **Progress Tracking**: Atomic counters for overall batch progress
//! - **Tracing**: `tracing-subscriber` setup driven by `RUST_LOG` or `-v`
//!
//! ```ignore
//! use aliquotmap::observability::{set_current_seed, set_phase, RunPhase};
//!
//! let _phase = set_phase(RunPhase::Iterating);
//! for seed in seeds {
//!     let _seed = set_current_seed(&seed);
//!     // A panic here reports the phase and the seed
//!     engine.run(&seed)?;
//! }
//! ```

pub mod context;
pub mod panic_hook;
pub mod tracing;

pub use context::{
    get_current_context, get_progress, increment_processed, reset_context, set_current_line,
    set_current_seed, set_phase, set_progress, ContextGuard, RunContext,
    RunPhase,
};
pub use panic_hook::install_panic_hook;
pub use self::tracing::{filter_directive, init_tracing};
