//! Exact number theory over arbitrary-precision naturals.
//!
//! Everything in this module works on [`Natural`] (an alias for
//! [`num_bigint::BigUint`]), so no intermediate value can be negative and no
//! floating point is involved. Values that fit in a machine word take `u64`
//! fast paths with `u128` intermediates; those paths give the same answers as
//! the big-integer code and exist only for speed.
//!
//! - [`primality`]: Miller-Rabin with a fixed witness set.
//! - [`factor`]: trial division plus Pollard's rho, driven by a caller-owned
//!   random source.
//! - [`sigma`]: the divisor-sum function computed from a factorization.

pub mod factor;
pub mod primality;
pub mod sigma;

pub use factor::{
    FactorConfig, FactorError, FactorStats, Factorization, Factorizer, MAX_TRIAL_LIMIT,
};
pub use primality::{is_prime_u64, is_probable_prime};
pub use sigma::{proper_divisor_sum, proper_from_sigma, sigma};

/// Natural numbers as used throughout the engine.
pub type Natural = num_bigint::BigUint;

/// Primes handled by trial division before any randomized work, and checked
/// directly by the primality test.
pub const SMALL_PRIMES: [u32; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Number of bits in the binary representation of `n` (zero for zero).
pub fn bit_length(n: &Natural) -> u64 {
    n.bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_length() {
        assert_eq!(bit_length(&Natural::from(0u32)), 0);
        assert_eq!(bit_length(&Natural::from(1u32)), 1);
        assert_eq!(bit_length(&Natural::from(255u32)), 8);
        assert_eq!(bit_length(&Natural::from(256u32)), 9);
        assert_eq!(bit_length(&(Natural::from(1u32) << 100u32)), 101);
    }
}
