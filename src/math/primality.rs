//! Miller-Rabin primality testing.
//!
//! The witness set `{2, 325, 9375, 28178, 450775, 9780504, 1795265022}` is a
//! known deterministic base set for every n below 2^64, so for that range
//! [`is_probable_prime`] is exact. Above 2^64 the same witnesses give a
//! probable-prime judgment: no counterexample is known, but none is ruled out
//! either. Callers that need certainty for huge values must not rely on it.

use super::{Natural, SMALL_PRIMES};
use num_traits::{One, ToPrimitive, Zero};

/// Miller-Rabin witnesses, tried in this order.
pub const WITNESSES: [u64; 7] = [2, 325, 9375, 28178, 450775, 9780504, 1795265022];

/// Decide whether `n` is prime.
///
/// Exact for `n < 2^64`; a probable-prime test beyond that.
pub fn is_probable_prime(n: &Natural) -> bool {
    match n.to_u64() {
        Some(small) => is_prime_u64(small),
        None => miller_rabin_big(n),
    }
}

/// Deterministic primality for machine-word values.
pub fn is_prime_u64(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in SMALL_PRIMES.map(u64::from) {
        if n == p {
            return true;
        }
        if n % p == 0 {
            return false;
        }
    }

    let n_minus_one = n - 1;
    let s = n_minus_one.trailing_zeros();
    let d = n_minus_one >> s;

    WITNESSES.iter().all(|&witness| {
        let a = witness % n;
        if a == 0 {
            return true;
        }
        let mut x = pow_mod_u64(a, d, n);
        if x == 1 || x == n_minus_one {
            return true;
        }
        for _ in 1..s {
            x = mul_mod_u64(x, x, n);
            if x == n_minus_one {
                return true;
            }
        }
        false
    })
}

/// Big-integer Miller-Rabin. Also correct for small values, which the tests
/// rely on to cross-check it against [`is_prime_u64`].
pub(crate) fn miller_rabin_big(n: &Natural) -> bool {
    if *n < Natural::from(2u32) {
        return false;
    }
    for p in SMALL_PRIMES {
        if *n == Natural::from(p) {
            return true;
        }
        if (n % p).is_zero() {
            return false;
        }
    }

    let n_minus_one = n - 1u32;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    WITNESSES.iter().all(|&witness| {
        let a = Natural::from(witness) % n;
        if a.is_zero() {
            return true;
        }
        witness_passes(&a, &d, s, n, &n_minus_one)
    })
}

fn witness_passes(a: &Natural, d: &Natural, s: u64, n: &Natural, n_minus_one: &Natural) -> bool {
    let mut x = a.modpow(d, n);
    if x.is_one() || x == *n_minus_one {
        return true;
    }
    for _ in 1..s {
        x = &x * &x % n;
        if x == *n_minus_one {
            return true;
        }
    }
    false
}

#[inline]
pub(crate) fn mul_mod_u64(a: u64, b: u64, m: u64) -> u64 {
    (u128::from(a) * u128::from(b) % u128::from(m)) as u64
}

pub(crate) fn pow_mod_u64(base: u64, mut exp: u64, m: u64) -> u64 {
    let mut result = 1 % m;
    let mut base = base % m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod_u64(result, base, m);
        }
        base = mul_mod_u64(base, base, m);
        exp >>= 1;
    }
    result
}
