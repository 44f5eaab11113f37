use aliquotmap::math::{is_probable_prime, proper_divisor_sum, sigma, FactorConfig, Factorizer, Natural};
use aliquotmap::sequence::{AliquotEngine, EngineConfig, Ending, PrimePolicy, SequenceStatus};
use num_traits::{One, ToPrimitive};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn factorizer(seed: u64) -> Factorizer<StdRng> {
    Factorizer::new(StdRng::seed_from_u64(seed), FactorConfig::default())
}

fn engine(seed: u64, config: EngineConfig) -> AliquotEngine<StdRng> {
    AliquotEngine::new(factorizer(seed), config)
}

fn brute_divisor_sum(n: u64) -> u64 {
    (1..=n / 2).filter(|d| n % d == 0).sum()
}

proptest! {
    #[test]
    fn prop_proper_divisor_sum_matches_brute_force(n in 2u64..20_000) {
        let mut f = factorizer(1);
        let sum = proper_divisor_sum(&Natural::from(n), &mut f).unwrap();
        prop_assert_eq!(sum.to_u64().unwrap(), brute_divisor_sum(n));
    }

    #[test]
    fn prop_factorization_multiplies_back(n in 2u64..u64::MAX, rng_seed in any::<u64>()) {
        let value = Natural::from(n);
        let factors = factorizer(rng_seed).factorize(&value).unwrap();
        prop_assert_eq!(factors.product(), value);
        for (prime, _) in factors.iter() {
            prop_assert!(is_probable_prime(prime));
        }
    }

    #[test]
    fn prop_wide_products_factor_exactly(a in 1u64 << 40..1u64 << 48, b in 1u64 << 40..1u64 << 48) {
        let value = Natural::from(a) * Natural::from(b);
        let factors = factorizer(a ^ b).factorize(&value).unwrap();
        prop_assert_eq!(factors.product(), value.clone());
        prop_assert!(sigma(&factors) > value);
    }

    #[test]
    fn prop_outcome_respects_budget(seed in 0u64..100_000, budget in 0u64..40) {
        let outcome = engine(seed, EngineConfig::default())
            .run_with_limit(&Natural::from(seed), budget)
            .unwrap();
        prop_assert!(outcome.steps <= budget);
        prop_assert!(outcome.peak.value >= outcome.seed);
        prop_assert!(outcome.peak.step <= outcome.steps);
        if outcome.ending == Ending::StepLimitReached {
            prop_assert_eq!(outcome.steps, budget);
        }
        if outcome.ending == Ending::Terminated {
            prop_assert!(outcome.final_value <= Natural::one());
        }
    }

    #[test]
    fn prop_random_stream_does_not_change_trajectory(seed in 2u64..1_000_000, a in any::<u64>(), b in any::<u64>()) {
        let config = EngineConfig::default().with_max_steps(30).with_trajectory();
        let x = engine(a, config.clone()).run(&Natural::from(seed)).unwrap();
        let y = engine(b, config).run(&Natural::from(seed)).unwrap();
        prop_assert_eq!(x.trajectory, y.trajectory);
        prop_assert_eq!(x.ending, y.ending);
        prop_assert_eq!(x.peak, y.peak);
    }

    #[test]
    fn prop_stop_at_prime_ends_no_later(seed in 2u64..50_000) {
        let descend = engine(0, EngineConfig::default().with_max_steps(60))
            .run(&Natural::from(seed))
            .unwrap();
        let mut config = EngineConfig::default().with_max_steps(60);
        config.prime_policy = PrimePolicy::StopAtPrime;
        let stop = engine(0, config).run(&Natural::from(seed)).unwrap();
        prop_assert!(stop.steps <= descend.steps);
        if stop.ending == Ending::Terminated && stop.steps < descend.steps {
            prop_assert!(is_probable_prime(&stop.final_value));
        }
    }
}

#[test]
fn test_known_cycles_classify() {
    let cases: [(u64, SequenceStatus); 4] = [
        (6, SequenceStatus::Perfect),
        (1184, SequenceStatus::Amicable),
        (14316, SequenceStatus::Sociable(28)),
        (95, SequenceStatus::Cycle),
    ];
    for (seed, expected) in cases {
        let outcome = engine(seed, EngineConfig::default()).run(&Natural::from(seed)).unwrap();
        assert_eq!(outcome.status(), expected, "seed {}", seed);
    }
}

#[test]
fn test_276_stays_open_and_grows() {
    let outcome = engine(7, EngineConfig::default())
        .run_with_limit(&Natural::from(276u32), 80)
        .unwrap();
    assert_eq!(outcome.ending, Ending::StepLimitReached);
    assert_eq!(outcome.steps, 80);
    assert!(outcome.peak_bits() > 40);
}
