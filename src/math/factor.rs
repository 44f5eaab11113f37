//! Integer factorization by trial division and Pollard's rho.
//!
//! # Operating envelope
//!
//! Pollard's rho finds a factor p in roughly sqrt(p) iterations, so the cost
//! is driven by the second-largest prime factor. Aliquot terms up to about 150
//! bits factor comfortably; hard semiprimes beyond that can take arbitrarily
//! long. The [`FactorConfig::max_restarts`] ceiling is the only guard.
//!
//! # Determinism
//!
//! The divisor search is randomized, and the random source is owned by the
//! [`Factorizer`] value the caller constructs. Which divisor a search happens
//! to find changes only the path through the worklist: the returned
//! [`Factorization`] is an ordered map, so the result is identical for every
//! random stream.

use super::primality::{is_probable_prime, mul_mod_u64};
use super::{Natural, SMALL_PRIMES};
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// First candidate of the 6k +/- 1 wheel that follows the small-prime pass.
const WHEEL_START: u64 = 41;

/// Largest wheel candidate trial division will ever try.
pub const MAX_TRIAL_LIMIT: u64 = 1 << 32;

fn default_trial_limit() -> u64 {
    20_000
}

/// Tuning for [`Factorizer`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FactorConfig {
    /// Largest wheel candidate tried by trial division after the small primes
    /// (default: 20000). Values below 41 disable the wheel; values above
    /// [`MAX_TRIAL_LIMIT`] are treated as that limit.
    #[serde(default = "default_trial_limit")]
    pub trial_limit: u64,

    /// Give up on a divisor search after this many failed rho rounds
    /// (default: unlimited).
    #[serde(default)]
    pub max_restarts: Option<u32>,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self {
            trial_limit: default_trial_limit(),
            max_restarts: None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FactorError {
    #[error("divisor search for {operand} gave up after {restarts} restarts")]
    RestartCeiling { operand: Natural, restarts: u32 },
}

/// Canonical prime-power factorization, ordered by prime.
///
/// The empty factorization represents 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Factorization {
    factors: BTreeMap<Natural, u32>,
}

impl Factorization {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `prime^exponent`, merging with an existing entry for the same prime.
    pub fn insert(&mut self, prime: Natural, exponent: u32) {
        if exponent == 0 {
            return;
        }
        *self.factors.entry(prime).or_insert(0) += exponent;
    }

    pub fn exponent(&self, prime: &Natural) -> u32 {
        self.factors.get(prime).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Natural, u32)> + '_ {
        self.factors.iter().map(|(p, &e)| (p, e))
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// True when this is the factorization of a single prime.
    pub fn is_prime(&self) -> bool {
        self.factors.len() == 1 && self.factors.values().all(|&e| e == 1)
    }

    /// Multiply the prime powers back together.
    pub fn product(&self) -> Natural {
        self.iter()
            .fold(Natural::one(), |acc, (p, e)| acc * p.pow(e))
    }
}

impl FromIterator<(Natural, u32)> for Factorization {
    fn from_iter<I: IntoIterator<Item = (Natural, u32)>>(iter: I) -> Self {
        let mut factorization = Self::new();
        for (prime, exponent) in iter {
            factorization.insert(prime, exponent);
        }
        factorization
    }
}

impl fmt::Display for Factorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "1");
        }
        for (i, (prime, exponent)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " * ")?;
            }
            if exponent == 1 {
                write!(f, "{}", prime)?;
            } else {
                write!(f, "{}^{}", prime, exponent)?;
            }
        }
        Ok(())
    }
}

/// Counters accumulated over the lifetime of a [`Factorizer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactorStats {
    pub factorizations: u64,
    pub splits: u64,
    pub restarts: u64,
}

/// Factorization context owning the random source for the divisor search.
///
/// One `Factorizer` per worker thread; it is deliberately not `Sync`-shared.
pub struct Factorizer<R> {
    rng: R,
    config: FactorConfig,
    stats: FactorStats,
}

impl<R: RngCore> Factorizer<R> {
    pub fn new(rng: R, config: FactorConfig) -> Self {
        Self {
            rng,
            config,
            stats: FactorStats::default(),
        }
    }

    pub fn config(&self) -> &FactorConfig {
        &self.config
    }

    pub fn stats(&self) -> FactorStats {
        self.stats
    }

    /// Reduce `n` to its canonical prime-power factorization.
    ///
    /// Values below 2 give the empty factorization.
    pub fn factorize(&mut self, n: &Natural) -> Result<Factorization, FactorError> {
        let mut result = Factorization::new();
        if *n < Natural::from(2u32) {
            return Ok(result);
        }
        self.stats.factorizations += 1;

        let mut residual = n.clone();
        for p in SMALL_PRIMES {
            let exponent = strip_small(&mut residual, p);
            result.insert(Natural::from(p), exponent);
        }
        self.strip_wheel(&mut residual, &mut result);

        // Residual composites wait on an explicit worklist.
        let mut pending = vec![residual];
        while let Some(m) = pending.pop() {
            if m.is_one() {
                continue;
            }
            if is_probable_prime(&m) {
                result.insert(m, 1);
                continue;
            }
            let divisor = self.find_divisor(&m)?;
            let quotient = &m / &divisor;
            self.stats.splits += 1;
            pending.push(divisor);
            pending.push(quotient);
        }

        Ok(result)
    }

    /// Find a nontrivial divisor of the composite `m`.
    ///
    /// Even values give 2 and multiples of 3 give 3 without touching the
    /// random source. Otherwise rho rounds run until one yields a divisor,
    /// restarting with fresh parameters whenever a round closes its cycle
    /// without one.
    pub fn find_divisor(&mut self, m: &Natural) -> Result<Natural, FactorError> {
        if m.is_even() {
            return Ok(Natural::from(2u32));
        }
        if (m % 3u32).is_zero() {
            return Ok(Natural::from(3u32));
        }
        if let Some(word) = m.to_u64() {
            return self.find_divisor_u64(word).map(Natural::from);
        }

        let mut restarts = 0u32;
        loop {
            let c = random_below(&mut self.rng, &(m - 1u32)) + 1u32;
            let start = random_below(&mut self.rng, m);
            if let Some(divisor) = rho_round(m, &c, start) {
                return Ok(divisor);
            }
            restarts += 1;
            self.record_restart(m, restarts)?;
        }
    }

    fn find_divisor_u64(&mut self, m: u64) -> Result<u64, FactorError> {
        let mut restarts = 0u32;
        loop {
            let c = self.rng.random_range(1..m);
            let start = self.rng.random_range(0..m);
            if let Some(divisor) = rho_round_u64(m, c, start) {
                return Ok(divisor);
            }
            restarts += 1;
            self.record_restart(&Natural::from(m), restarts)?;
        }
    }

    fn record_restart(&mut self, operand: &Natural, restarts: u32) -> Result<(), FactorError> {
        self.stats.restarts += 1;
        tracing::trace!(%operand, restarts, "rho round closed without a divisor");
        match self.config.max_restarts {
            Some(ceiling) if restarts > ceiling => Err(FactorError::RestartCeiling {
                operand: operand.clone(),
                restarts,
            }),
            _ => Ok(()),
        }
    }

    fn strip_wheel(&self, residual: &mut Natural, result: &mut Factorization) {
        let limit = self.config.trial_limit.min(MAX_TRIAL_LIMIT);
        let mut candidate = WHEEL_START;
        let mut step = 2;
        while candidate <= limit {
            if let Some(word) = residual.to_u64() {
                if u128::from(candidate) * u128::from(candidate) > u128::from(word) {
                    break;
                }
            }
            let mut exponent = 0;
            while (&*residual % candidate).is_zero() {
                *residual /= candidate;
                exponent += 1;
            }
            if exponent > 0 {
                result.insert(Natural::from(candidate), exponent);
            }
            candidate += step;
            step = 6 - step;
        }
    }
}

fn strip_small(residual: &mut Natural, p: u32) -> u32 {
    let mut exponent = 0;
    while (&*residual % p).is_zero() {
        *residual /= p;
        exponent += 1;
    }
    exponent
}

/// One Floyd cycle-detection round of `v -> v^2 + c (mod m)`.
///
/// Returns `None` when the cycle closes (gcd equals `m`).
fn rho_round(m: &Natural, c: &Natural, start: Natural) -> Option<Natural> {
    let advance = |v: &Natural| (v * v + c) % m;
    let mut slow = start.clone();
    let mut fast = start;
    loop {
        slow = advance(&slow);
        fast = advance(&advance(&fast));
        let diff = if slow >= fast {
            &slow - &fast
        } else {
            &fast - &slow
        };
        let g = diff.gcd(m);
        if g.is_one() {
            continue;
        }
        return if g == *m { None } else { Some(g) };
    }
}

fn rho_round_u64(m: u64, c: u64, start: u64) -> Option<u64> {
    let advance = |v: u64| ((u128::from(mul_mod_u64(v, v, m)) + u128::from(c)) % u128::from(m)) as u64;
    let mut slow = start;
    let mut fast = start;
    loop {
        slow = advance(slow);
        fast = advance(advance(fast));
        let g = slow.abs_diff(fast).gcd(&m);
        if g == 1 {
            continue;
        }
        return if g == m { None } else { Some(g) };
    }
}

/// Uniform-enough draw from `[0, bound)`; `bound` must be positive.
///
/// Eight spare random bytes keep the modulo bias negligible.
fn random_below<R: RngCore>(rng: &mut R, bound: &Natural) -> Natural {
    let len = bound.bits().div_ceil(8) as usize + 8;
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes);
    Natural::from_bytes_le(&bytes) % bound
}
