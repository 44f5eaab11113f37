//! Sum-of-divisors from a factorization.

use super::factor::{FactorError, Factorization, Factorizer};
use super::Natural;
use num_traits::{CheckedSub, One, Zero};
use rand::RngCore;

/// sigma(n), the sum of all positive divisors, from the factorization of n.
///
/// Each prime power contributes `(p^(e+1) - 1) / (p - 1)`; the contributions
/// multiply because distinct prime powers are coprime.
pub fn sigma(factorization: &Factorization) -> Natural {
    factorization
        .iter()
        .fold(Natural::one(), |acc, (prime, exponent)| {
            acc * prime_power_divisor_sum(prime, exponent)
        })
}

fn prime_power_divisor_sum(prime: &Natural, exponent: u32) -> Natural {
    let numerator = prime.pow(exponent + 1) - 1u32;
    let denominator = prime - 1u32;
    debug_assert!((&numerator % &denominator).is_zero());
    numerator / denominator
}

/// Sum of the proper divisors of `n`: `sigma(n) - n`, and 0 for `n <= 1`.
///
/// # Panics
///
/// Panics if sigma comes out below `n`, which can only happen when the
/// factorization is wrong.
pub fn proper_divisor_sum<R: RngCore>(
    n: &Natural,
    factorizer: &mut Factorizer<R>,
) -> Result<Natural, FactorError> {
    if *n <= Natural::one() {
        return Ok(Natural::zero());
    }
    let total = sigma(&factorizer.factorize(n)?);
    Ok(proper_from_sigma(n, &total))
}

/// `total - n`, the proper divisor sum given `total = sigma(n)`.
///
/// # Panics
///
/// Panics if `total < n`; no correct factorization produces that.
pub fn proper_from_sigma(n: &Natural, total: &Natural) -> Natural {
    match total.checked_sub(n) {
        Some(proper) => proper,
        None => panic!("sigma({}) = {} is below the value itself", n, total),
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

    fn factorizer() -> Factorizer<StdRng> {
        Factorizer::new(StdRng::seed_from_u64(0xC0FFEE), FactorConfig::default())
    }

    fn sigma_of(n: u64) -> u64 {
        let f = factorizer().factorize(&Natural::from(n)).unwrap();
        sigma(&f).to_u64().unwrap()
    }

    /// Divisor sums for every n <= limit by direct enumeration of multiples.
    fn brute_force_sigmas(limit: usize) -> Vec<u64> {
        let mut sums = vec![0u64; limit + 1];
        for d in 1..=limit {
            let mut multiple = d;
            while multiple <= limit {
                sums[multiple] += d as u64;
                multiple += d;
            }
        }
        sums
    }

    #[test]
    fn test_perfect_number_28() {
        assert_eq!(sigma_of(28), 56);
        let proper = proper_divisor_sum(&Natural::from(28u32), &mut factorizer()).unwrap();
        assert_eq!(proper, Natural::from(28u32));
    }

    #[test]
    fn test_sigma_of_one_is_one() {
        assert_eq!(sigma(&Factorization::new()), Natural::one());
    }

    #[test]
    fn test_proper_divisor_sum_small_values() {
        let mut f = factorizer();
        assert_eq!(proper_divisor_sum(&Natural::zero(), &mut f).unwrap(), Natural::zero());
        assert_eq!(proper_divisor_sum(&Natural::one(), &mut f).unwrap(), Natural::zero());
        assert_eq!(proper_divisor_sum(&Natural::from(2u32), &mut f).unwrap(), Natural::one());
        assert_eq!(
            proper_divisor_sum(&Natural::from(220u32), &mut f).unwrap(),
            Natural::from(284u32)
        );
        assert_eq!(
            proper_divisor_sum(&Natural::from(284u32), &mut f).unwrap(),
            Natural::from(220u32)
        );
    }

    #[test]
    fn test_matches_brute_force_below_100k() {
        let limit = 99_999;
        let expected = brute_force_sigmas(limit);
        let mut f = factorizer();
        for n in 1..=limit {
            let computed = sigma(&f.factorize(&Natural::from(n)).unwrap());
            assert_eq!(computed, Natural::from(expected[n]), "sigma({}) mismatch", n);
        }
    }

    #[test]
    fn test_proper_from_sigma() {
        assert_eq!(
            proper_from_sigma(&Natural::from(220u32), &Natural::from(504u32)),
            Natural::from(284u32)
        );
    }

    #[test]
    #[should_panic(expected = "is below the value itself")]
    fn test_sigma_below_value_panics() {
        proper_from_sigma(&Natural::from(10u32), &Natural::from(9u32));
    }

    #[test]
    fn test_large_prime_power() {
        // sigma(2^100) = 2^101 - 1
        let one = Natural::one();
        let mut f = Factorization::new();
        f.insert(Natural::from(2u32), 100);
        assert_eq!(sigma(&f), (&one << 101u32) - 1u32);
    }

    proptest! {
        #[test]
        fn sigma_is_multiplicative_for_coprimes(a in 1u64..100_000, b in 1u64..100_000) {
            prop_assume!(num_integer::gcd(a, b) == 1);
            prop_assert_eq!(
                u128::from(sigma_of(a)) * u128::from(sigma_of(b)),
                u128::from(sigma_of(a * b))
            );
        }
    }
}
