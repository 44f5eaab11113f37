//! The aliquot iteration itself.

use super::ending::Ending;
use super::outcome::{PeakRecord, SequenceOutcome};
use crate::math::{is_probable_prime, proper_divisor_sum, FactorError, Factorizer, Natural};
use num_traits::{One, Zero};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, debug_span, trace};

fn default_max_steps() -> u64 {
    3000
}

/// What to do when a step produces a prime.
///
/// A prime p always continues p -> 1, so the choice only moves the point at
/// which the trajectory is called terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimePolicy {
    /// Keep iterating until the value drops to 1 or 0.
    #[default]
    Descend,
    /// Stop as soon as a step yields a prime; the prime is the final value.
    StopAtPrime,
}

/// Settings for [`AliquotEngine`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Step budget per seed (default: 3000)
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// Prime handling (default: descend)
    #[serde(default)]
    pub prime_policy: PrimePolicy,

    /// Keep every value of the trajectory in the outcome.
    #[serde(skip)]
    pub record_trajectory: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            prime_policy: PrimePolicy::default(),
            record_trajectory: false,
        }
    }
}

impl EngineConfig {
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_trajectory(mut self) -> Self {
        self.record_trajectory = true;
        self
    }
}

/// State of one trajectory between steps.
///
/// Created per seed and thrown away once the outcome is taken, so nothing
/// leaks between seeds.
#[derive(Debug, Clone)]
pub struct AliquotSequence {
    seed: Natural,
    current: Natural,
    step: u64,
    visited: HashMap<Natural, u64>,
    peak: PeakRecord,
    ending: Option<Ending>,
    trajectory: Option<Vec<Natural>>,
    prime_policy: PrimePolicy,
}

impl AliquotSequence {
    pub fn new(seed: Natural, config: &EngineConfig) -> Self {
        let mut visited = HashMap::new();
        visited.insert(seed.clone(), 0);
        // Zero has no divisors to sum; it is terminal before any step.
        let ending = seed.is_zero().then_some(Ending::Terminated);
        Self {
            current: seed.clone(),
            peak: PeakRecord::new(seed.clone(), 0),
            trajectory: config.record_trajectory.then(|| vec![seed.clone()]),
            seed,
            step: 0,
            visited,
            ending,
            prime_policy: config.prime_policy,
        }
    }

    pub fn seed(&self) -> &Natural {
        &self.seed
    }

    pub fn current(&self) -> &Natural {
        &self.current
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn peak(&self) -> &PeakRecord {
        &self.peak
    }

    pub fn ending(&self) -> Option<Ending> {
        self.ending
    }

    pub fn is_finished(&self) -> bool {
        self.ending.is_some()
    }

    /// Apply the aliquot map once.
    ///
    /// Returns the ending if this step classified the trajectory. Calling it
    /// on a finished sequence changes nothing.
    pub fn advance<R: RngCore>(
        &mut self,
        factorizer: &mut Factorizer<R>,
    ) -> Result<Option<Ending>, FactorError> {
        if self.ending.is_some() {
            return Ok(self.ending);
        }

        let next = proper_divisor_sum(&self.current, factorizer)?;
        let step = self.step + 1;
        trace!(step, value = %next, "aliquot step");

        let ending = if next <= Natural::one() {
            Some(Ending::Terminated)
        } else if let Some(&first_seen) = self.visited.get(&next) {
            Some(Ending::Cycle(step - first_seen))
        } else {
            self.visited.insert(next.clone(), step);
            self.peak.observe(&next, step);
            (self.prime_policy == PrimePolicy::StopAtPrime && is_probable_prime(&next))
                .then_some(Ending::Terminated)
        };

        if let Some(values) = self.trajectory.as_mut() {
            values.push(next.clone());
        }
        self.current = next;
        self.step = step;
        self.ending = ending;
        Ok(ending)
    }

    /// Finish the trajectory; an unclassified sequence counts as step-limited.
    ///
    /// The final value is the last value produced: the one that terminated or
    /// closed the cycle, or the current state when the budget ran out.
    pub fn into_outcome(self, elapsed: Duration) -> SequenceOutcome {
        SequenceOutcome {
            ending: self.ending.unwrap_or(Ending::StepLimitReached),
            seed: self.seed,
            steps: self.step,
            final_value: self.current,
            peak: self.peak,
            trajectory: self.trajectory,
            elapsed,
        }
    }
}

/// Runs aliquot sequences for one worker.
///
/// Owns its [`Factorizer`], and with it the random source, so engines on
/// different threads never share state.
pub struct AliquotEngine<R> {
    factorizer: Factorizer<R>,
    config: EngineConfig,
}

impl<R: RngCore> AliquotEngine<R> {
    pub fn new(factorizer: Factorizer<R>, config: EngineConfig) -> Self {
        Self { factorizer, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn factorizer(&self) -> &Factorizer<R> {
        &self.factorizer
    }

    /// Iterate from `seed` until classification or the step budget.
    pub fn run(&mut self, seed: &Natural) -> Result<SequenceOutcome, FactorError> {
        self.run_with_limit(seed, self.config.max_steps)
    }

    /// Like [`run`](Self::run) with an explicit step budget for this seed.
    pub fn run_with_limit(
        &mut self,
        seed: &Natural,
        max_steps: u64,
    ) -> Result<SequenceOutcome, FactorError> {
        let span = debug_span!("aliquot", %seed, max_steps);
        let _enter = span.enter();
        let started = Instant::now();

        let mut sequence = AliquotSequence::new(seed.clone(), &self.config);
        while !sequence.is_finished() && sequence.step() < max_steps {
            sequence.advance(&mut self.factorizer)?;
        }

        let outcome = sequence.into_outcome(started.elapsed());
        debug!(
            steps = outcome.steps,
            ended = %outcome.ending,
            peak_bits = outcome.peak_bits(),
            elapsed_us = outcome.elapsed.as_micros() as u64,
            "sequence classified"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FactorConfig;
    use num_traits::ToPrimitive;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engine(config: EngineConfig) -> AliquotEngine<StdRng> {
        let factorizer = Factorizer::new(StdRng::seed_from_u64(0xC0FFEE), FactorConfig::default());
        AliquotEngine::new(factorizer, config)
    }

    fn run(seed: u64, max_steps: u64) -> SequenceOutcome {
        engine(EngineConfig::default().with_max_steps(max_steps))
            .run(&Natural::from(seed))
            .unwrap()
    }

    #[test]
    fn test_amicable_pair_220() {
        let outcome = run(220, 100);
        assert_eq!(outcome.ending, Ending::Cycle(2));
        assert_eq!(outcome.steps, 2);
        assert_eq!(outcome.final_value, Natural::from(220u32));
        assert_eq!(outcome.peak, PeakRecord::new(Natural::from(284u32), 1));
    }

    #[test]
    fn test_perfect_number_6() {
        let outcome = run(6, 100);
        assert_eq!(outcome.ending, Ending::Cycle(1));
        assert_eq!(outcome.steps, 1);
        assert_eq!(outcome.final_value, Natural::from(6u32));
        assert_eq!(outcome.peak, PeakRecord::new(Natural::from(6u32), 0));
    }

    #[test]
    fn test_sociable_chain_12496() {
        let outcome = run(12496, 100);
        assert_eq!(outcome.ending, Ending::Cycle(5));
        assert_eq!(outcome.steps, 5);
        assert_eq!(outcome.peak, PeakRecord::new(Natural::from(15472u32), 2));
    }

    #[test]
    fn test_pre_period_before_cycle() {
        // 25 -> 6 -> 6
        let outcome = run(25, 100);
        assert_eq!(outcome.ending, Ending::Cycle(1));
        assert_eq!(outcome.steps, 2);
        assert_eq!(outcome.final_value, Natural::from(6u32));
        assert_eq!(outcome.peak.step, 0);
    }

    #[test]
    fn test_prime_seed_descends_to_one() {
        for p in [2u64, 3, 7, 97, 1_000_003] {
            let outcome = run(p, 100);
            assert_eq!(outcome.ending, Ending::Terminated);
            assert_eq!(outcome.steps, 1, "p -> 1 in one step for {}", p);
            assert_eq!(outcome.final_value, Natural::one());
        }
    }

    #[test]
    fn test_terminating_sequence_counts_final_step() {
        // 10 -> 8 -> 7 -> 1
        let outcome = run(10, 100);
        assert_eq!(outcome.ending, Ending::Terminated);
        assert_eq!(outcome.steps, 3);
        assert_eq!(outcome.final_value, Natural::one());
        assert_eq!(outcome.peak, PeakRecord::new(Natural::from(10u32), 0));
    }

    #[test]
    fn test_seed_zero_and_one() {
        let zero = run(0, 100);
        assert_eq!(zero.ending, Ending::Terminated);
        assert_eq!(zero.steps, 0);
        assert_eq!(zero.final_value, Natural::zero());

        let one = run(1, 100);
        assert_eq!(one.ending, Ending::Terminated);
        assert_eq!(one.steps, 1);
        assert_eq!(one.final_value, Natural::zero());
    }

    #[test]
    fn test_step_limit_reports_current_state() {
        // 12 -> 16 -> 15 -> 9 -> 4 -> 3 -> 1
        let outcome = run(12, 3);
        assert_eq!(outcome.ending, Ending::StepLimitReached);
        assert_eq!(outcome.steps, 3);
        assert_eq!(outcome.final_value, Natural::from(9u32));
        assert_eq!(outcome.peak, PeakRecord::new(Natural::from(16u32), 1));
    }

    #[test]
    fn test_zero_budget() {
        let outcome = run(12, 0);
        assert_eq!(outcome.ending, Ending::StepLimitReached);
        assert_eq!(outcome.steps, 0);
        assert_eq!(outcome.final_value, Natural::from(12u32));
    }

    #[test]
    fn test_stop_at_prime_policy() {
        let config = EngineConfig {
            prime_policy: PrimePolicy::StopAtPrime,
            ..EngineConfig::default()
        };
        // 10 -> 8 -> 7 stops at the prime 7
        let outcome = engine(config).run(&Natural::from(10u32)).unwrap();
        assert_eq!(outcome.ending, Ending::Terminated);
        assert_eq!(outcome.steps, 2);
        assert_eq!(outcome.final_value, Natural::from(7u32));
    }

    #[test]
    fn test_trajectory_recording() {
        let config = EngineConfig::default().with_trajectory();
        let outcome = engine(config).run(&Natural::from(12u32)).unwrap();
        let values: Vec<u64> = outcome
            .trajectory
            .unwrap()
            .iter()
            .map(|v| v.to_u64().unwrap())
            .collect();
        assert_eq!(values, vec![12, 16, 15, 9, 4, 3, 1]);
        assert_eq!(outcome.steps, 6);
    }

    #[test]
    fn test_advance_after_finish_is_noop() {
        let mut factorizer = Factorizer::new(StdRng::seed_from_u64(1), FactorConfig::default());
        let mut sequence = AliquotSequence::new(Natural::from(6u32), &EngineConfig::default());
        assert_eq!(sequence.advance(&mut factorizer).unwrap(), Some(Ending::Cycle(1)));
        assert_eq!(sequence.advance(&mut factorizer).unwrap(), Some(Ending::Cycle(1)));
        assert_eq!(sequence.step(), 1);
    }

    /// Proper divisor sum by trial division up to sqrt(n).
    fn brute_force_aliquot(n: u64) -> u64 {
        if n <= 1 {
            return 0;
        }
        let mut total = 1;
        let mut d = 2;
        while d * d <= n {
            if n % d == 0 {
                total += d;
                if d != n / d {
                    total += n / d;
                }
            }
            d += 1;
        }
        total
    }

    /// Trajectory by brute force, stopping where the engine classifies.
    fn brute_force_trajectory(seed: u64, budget: usize) -> Vec<u64> {
        let mut values = vec![seed];
        let mut seen = HashMap::from([(seed, 0usize)]);
        while seed > 0 && values.len() <= budget {
            let next = brute_force_aliquot(*values.last().unwrap());
            values.push(next);
            if next <= 1 || seen.insert(next, values.len() - 1).is_some() {
                break;
            }
        }
        values
    }

    fn recorded(outcome: &SequenceOutcome) -> Vec<u64> {
        outcome
            .trajectory
            .as_ref()
            .unwrap()
            .iter()
            .map(|v| v.to_u64().unwrap())
            .collect()
    }

    fn first_max(values: &[u64]) -> (u64, u64) {
        let max = *values.iter().max().unwrap();
        let first = values.iter().position(|&v| v == max).unwrap() as u64;
        (max, first)
    }

    #[test]
    fn test_peak_matches_brute_force_trajectory() {
        let mut engine = engine(EngineConfig::default().with_max_steps(8).with_trajectory());
        for seed in 1..600u64 {
            let outcome = engine.run(&Natural::from(seed)).unwrap();
            let values = brute_force_trajectory(seed, 8);
            assert_eq!(recorded(&outcome), values, "trajectory mismatch for seed {}", seed);

            let (max, first) = first_max(&values);
            assert_eq!(outcome.peak.value, Natural::from(max), "seed {}", seed);
            assert_eq!(outcome.peak.step, first, "seed {}", seed);
        }
    }

    proptest! {
        #[test]
        fn prop_peak_matches_brute_force_below_100k(seed in 1u64..100_000, budget in 1usize..16) {
            let outcome = engine(EngineConfig::default().with_max_steps(budget as u64).with_trajectory())
                .run(&Natural::from(seed))
                .unwrap();
            let values = brute_force_trajectory(seed, budget);
            prop_assert_eq!(recorded(&outcome), values.clone());

            let (max, first) = first_max(&values);
            prop_assert_eq!(outcome.peak.value, Natural::from(max));
            prop_assert_eq!(outcome.peak.step, first);
        }
    }
}
