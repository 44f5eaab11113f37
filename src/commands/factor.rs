use super::record_rng;
use crate::aliquotmap_error::AliquotError;
use crate::config::AliquotConfig;
use crate::io::parse_natural;
use crate::math::{is_probable_prime, proper_from_sigma, sigma, Factorizer, Natural};
use crate::observability::{set_current_seed, set_phase, RunPhase};
use anyhow::Result;
use num_traits::One;
use std::io::Write;

/// Print `n = factorization`, sigma, the proper divisor sum and primality
/// for each number.
pub fn factor_numbers<W: Write>(numbers: &[String], settings: &AliquotConfig, mut out: W) -> Result<()> {
    let _phase = set_phase(RunPhase::Factoring);
    let mut factorizer = Factorizer::new(
        record_rng(settings.factor.rng_seed, 0),
        settings.factor.factor_config(),
    );

    for text in numbers {
        let n = parse_natural(text)
            .map_err(|_| AliquotError::cli_invalid_arg(text, "expected a non-negative integer"))?;
        let _seed = set_current_seed(&n);

        let factorization = factorizer
            .factorize(&n)
            .map_err(|e| AliquotError::engine(&e, Some(n.clone())))?;
        let divisor_sum = if n <= Natural::one() {
            // sigma(0) is undefined and sigma(1) = 1; both have no proper divisors
            writeln!(out, "{} = {}", n, n)?;
            writeln!(out, "  sigma: {}", if n.is_one() { "1" } else { "-" })?;
            Natural::from(0u32)
        } else {
            let total = sigma(&factorization);
            writeln!(out, "{} = {}", n, factorization)?;
            writeln!(out, "  sigma: {}", total)?;
            proper_from_sigma(&n, &total)
        };
        writeln!(out, "  proper divisor sum: {}", divisor_sum)?;
        writeln!(out, "  prime: {}", is_probable_prime(&n))?;
    }

    tracing::debug!(stats = ?factorizer.stats(), "factorizer counters");
    out.flush()?;
    Ok(())
}
