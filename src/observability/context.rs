//! Thread-local context tracking for crash reports.
//!
//! Records the current run phase and the seed being iterated. Context is
//! per thread (via `thread_local!`), so each rayon worker reports its own
//! seed; progress is global and kept in atomic counters.
//!
//! ## Thread Safety
//!
//! - Thread-local context: Each thread has its own context
//! - Global progress: Atomic counters for seeds processed/total
//! - Context guards use RAII for automatic cleanup on drop

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Seed digits kept in the context; larger seeds are cut with an ellipsis.
const MAX_SEED_DIGITS: usize = 64;

static SEEDS_PROCESSED: AtomicUsize = AtomicUsize::new(0);
static SEEDS_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT_CONTEXT: RefCell<RunContext> = const { RefCell::new(RunContext::new()) };
}

/// What aliquotmap was doing on this thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    pub phase: Option<RunPhase>,
    /// Decimal digits of the seed being iterated.
    pub current_seed: Option<String>,
    /// 1-based input line of the record being processed.
    pub current_line: Option<usize>,
}

impl RunContext {
    /// Create a new empty context.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_seed: None,
            current_line: None,
        }
    }
}

/// Major stages of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Reading `.aliquotmap.toml`
    ConfigLoading,
    /// Reading seed records
    InputParsing,
    /// Factoring a single number
    Factoring,
    /// Running aliquot sequences
    Iterating,
    /// Comparing recomputed results with reported ones
    Verification,
    /// Writing records and summaries
    OutputGeneration,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigLoading => write!(f, "config_loading"),
            Self::InputParsing => write!(f, "input_parsing"),
            Self::Factoring => write!(f, "factoring"),
            Self::Iterating => write!(f, "iterating"),
            Self::Verification => write!(f, "verification"),
            Self::OutputGeneration => write!(f, "output_generation"),
        }
    }
}

/// RAII guard restoring the previous context on drop.
pub struct ContextGuard {
    previous: RunContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

fn update(apply: impl FnOnce(&mut RunContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        apply(&mut ctx.borrow_mut());
        ContextGuard { previous }
    })
}

/// Set the current phase until the guard drops.
#[must_use]
pub fn set_phase(phase: RunPhase) -> ContextGuard {
    update(|ctx| ctx.phase = Some(phase))
}

/// Record the seed being iterated until the guard drops.
#[must_use]
pub fn set_current_seed(seed: impl fmt::Display) -> ContextGuard {
    let mut digits = seed.to_string();
    if digits.len() > MAX_SEED_DIGITS {
        digits.truncate(MAX_SEED_DIGITS - 3);
        digits.push_str("...");
    }
    update(|ctx| ctx.current_seed = Some(digits))
}

/// Record the input line being processed until the guard drops.
#[must_use]
pub fn set_current_line(line: usize) -> ContextGuard {
    update(|ctx| ctx.current_line = Some(line))
}

/// Set the progress counters (processed and total seeds).
pub fn set_progress(processed: usize, total: usize) {
    SEEDS_PROCESSED.store(processed, Ordering::Relaxed);
    SEEDS_TOTAL.store(total, Ordering::Relaxed);
}

/// Increment the processed seed count from any thread.
pub fn increment_processed() {
    SEEDS_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

/// Snapshot of this thread's context.
#[must_use]
pub fn get_current_context() -> RunContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Current progress as (processed, total).
#[must_use]
pub fn get_progress() -> (usize, usize) {
    (
        SEEDS_PROCESSED.load(Ordering::Relaxed),
        SEEDS_TOTAL.load(Ordering::Relaxed),
    )
}

/// Reset the current thread's context to empty.
pub fn reset_context() {
    CURRENT_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = RunContext::new();
    });
}
