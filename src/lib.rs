//! Aliquot sequence engine.
//!
//! The numeric core lives in [`math`] (primality, factorization, divisor
//! sums) and [`sequence`] (iteration, peak tracking, classification). The
//! remaining modules are the thin front ends behind the `aliquotmap` binary.

pub mod aliquotmap_error;
pub mod cli;
pub mod commands;
pub mod config;
pub mod io;
pub mod math;
pub mod observability;
pub mod progress;
pub mod sequence;
pub mod summary;

pub use crate::aliquotmap_error::{AliquotError, ErrorCode};
pub use crate::config::AliquotConfig;
pub use crate::io::{OutputFormat, SequenceRecord};
pub use crate::math::{
    is_probable_prime, proper_divisor_sum, sigma, FactorConfig, FactorError, Factorization,
    Factorizer, Natural,
};
pub use crate::sequence::{
    AliquotEngine, EngineConfig, Ending, PrimePolicy, SequenceOutcome, SequenceStatus,
};
pub use crate::summary::BatchSummary;
