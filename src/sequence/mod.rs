//! Aliquot sequence iteration with peak tracking and classification.
//!
//! Each step maps a value n to `sigma(n) - n`. A trajectory ends when:
//!
//! - the value drops to 1 or 0 ([`Ending::Terminated`]),
//! - a value repeats ([`Ending::Cycle`] with the cycle length),
//! - the step budget runs out ([`Ending::StepLimitReached`]).
//!
//! ```rust
//! use aliquotmap::math::{FactorConfig, Factorizer, Natural};
//! use aliquotmap::sequence::{AliquotEngine, EngineConfig, Ending};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let factorizer = Factorizer::new(StdRng::seed_from_u64(7), FactorConfig::default());
//! let mut engine = AliquotEngine::new(factorizer, EngineConfig::default());
//! let outcome = engine.run(&Natural::from(220u32)).unwrap();
//! assert_eq!(outcome.ending, Ending::Cycle(2));
//! ```

pub mod ending;
pub mod engine;
pub mod outcome;

pub use ending::{Ending, ParseEndingError, SequenceStatus};
pub use engine::{AliquotEngine, AliquotSequence, EngineConfig, PrimePolicy};
pub use outcome::{PeakRecord, SequenceOutcome, PEAK_PREFIX_DIGITS};
