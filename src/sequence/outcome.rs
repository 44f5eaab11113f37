//! Results of running one seed.

use super::ending::{Ending, SequenceStatus};
use crate::math::{bit_length, Natural};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Decimal digits kept by [`PeakRecord::prefix`].
pub const PEAK_PREFIX_DIGITS: usize = 48;

/// Largest value seen over a trajectory prefix and where it first appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakRecord {
    pub value: Natural,
    pub step: u64,
}

impl PeakRecord {
    pub fn new(value: Natural, step: u64) -> Self {
        Self { value, step }
    }

    /// Raise the peak only on a strictly larger value, so ties keep the
    /// earliest step.
    pub fn observe(&mut self, value: &Natural, step: u64) -> bool {
        if *value > self.value {
            self.value = value.clone();
            self.step = step;
            true
        } else {
            false
        }
    }

    pub fn bits(&self) -> u64 {
        bit_length(&self.value)
    }

    /// Leading decimal digits of the peak.
    pub fn prefix(&self) -> String {
        let mut digits = self.value.to_str_radix(10);
        digits.truncate(PEAK_PREFIX_DIGITS);
        digits
    }

    /// Lower-case hex SHA-256 of the peak's decimal digits.
    pub fn fingerprint(&self) -> String {
        format!("{:x}", Sha256::digest(self.value.to_str_radix(10).as_bytes()))
    }
}

/// Everything the engine reports for a single seed.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceOutcome {
    pub seed: Natural,
    /// Steps executed, including the one that produced the final value.
    pub steps: u64,
    pub ending: Ending,
    pub final_value: Natural,
    pub peak: PeakRecord,
    /// Every value from step 0 onward, when recording was requested.
    pub trajectory: Option<Vec<Natural>>,
    pub elapsed: Duration,
}

impl SequenceOutcome {
    pub fn status(&self) -> SequenceStatus {
        SequenceStatus::classify(self.ending, &self.seed, &self.final_value)
    }

    pub fn peak_bits(&self) -> u64 {
        self.peak.bits()
    }
}
