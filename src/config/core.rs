use serde::{Deserialize, Serialize};

use super::parallel::ParallelConfig;
use crate::aliquotmap_error::AliquotError;
use crate::math::{FactorConfig, MAX_TRIAL_LIMIT};
use crate::sequence::EngineConfig;

/// RNG seed used when the configuration does not name one.
pub const DEFAULT_RNG_SEED: u64 = 0xC0FFEE;

fn default_rng_seed() -> Option<u64> {
    Some(DEFAULT_RNG_SEED)
}

/// Root configuration structure for aliquotmap
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AliquotConfig {
    /// Iteration settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Factorization settings
    #[serde(default)]
    pub factor: FactorSettings,

    /// Batch parallelism
    #[serde(default)]
    pub parallel: ParallelConfig,
}

/// The `[factor]` table: factorizer tuning plus the batch RNG seed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FactorSettings {
    /// `trial_limit` and `max_restarts`
    #[serde(flatten)]
    pub tuning: FactorConfig,

    /// Base seed for per-record random streams. `None` draws every stream
    /// from the operating system, so runs are no longer reproducible.
    #[serde(default = "default_rng_seed")]
    pub rng_seed: Option<u64>,
}

impl Default for FactorSettings {
    fn default() -> Self {
        Self {
            tuning: FactorConfig::default(),
            rng_seed: default_rng_seed(),
        }
    }
}

impl FactorSettings {
    pub fn factor_config(&self) -> FactorConfig {
        self.tuning.clone()
    }
}

impl AliquotConfig {
    /// Check values serde cannot rule out on its own.
    pub fn validate(&self) -> Result<(), AliquotError> {
        let mut errors = Vec::new();
        if self.engine.max_steps == 0 {
            errors.push(AliquotError::config_with_field(
                "must be greater than zero",
                "engine.max_steps",
            ));
        }
        if self.factor.tuning.trial_limit > MAX_TRIAL_LIMIT {
            errors.push(AliquotError::config_with_field(
                format!("must be at most {}", MAX_TRIAL_LIMIT),
                "factor.trial_limit",
            ));
        }
        if self.parallel.batch_size == Some(0) {
            errors.push(AliquotError::config_with_field(
                "must be greater than zero",
                "parallel.batch_size",
            ));
        }
        if self.parallel.max_concurrency == Some(0) {
            errors.push(AliquotError::config_with_field(
                "must be greater than zero",
                "parallel.max_concurrency",
            ));
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(AliquotError::Validation {
                code: crate::aliquotmap_error::ErrorCode::VALIDATION_GENERIC,
                count: errors.len(),
                errors: errors.iter().map(ToString::to_string).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::PrimePolicy;
    use indoc::indoc;

    #[test]
    fn test_defaults() {
        let config = AliquotConfig::default();
        assert_eq!(config.engine.max_steps, 3000);
        assert_eq!(config.engine.prime_policy, PrimePolicy::Descend);
        assert_eq!(config.factor.tuning.trial_limit, 20_000);
        assert_eq!(config.factor.rng_seed, Some(DEFAULT_RNG_SEED));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AliquotConfig = toml::from_str(indoc! {r#"
            [engine]
            prime_policy = "stop-at-prime"

            [factor]
            max_restarts = 64
        "#})
        .unwrap();
        assert_eq!(config.engine.max_steps, 3000);
        assert_eq!(config.engine.prime_policy, PrimePolicy::StopAtPrime);
        assert_eq!(config.factor.tuning.max_restarts, Some(64));
        assert_eq!(config.factor.tuning.trial_limit, 20_000);
        assert_eq!(config.factor.factor_config().max_restarts, Some(64));
        assert!(config.parallel.enabled);
    }

    #[test]
    fn test_rejects_zero_budget() {
        let mut config = AliquotConfig::default();
        config.engine.max_steps = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("engine.max_steps"));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_collects_every_problem() {
        let mut config = AliquotConfig::default();
        config.engine.max_steps = 0;
        config.parallel.batch_size = Some(0);
        match config.validate().unwrap_err() {
            AliquotError::Validation { count, errors, .. } => {
                assert_eq!(count, 2);
                assert!(errors[1].contains("parallel.batch_size"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_unbounded_trial_limit() {
        let config: AliquotConfig = toml::from_str(indoc! {r#"
            [factor]
            trial_limit = 9223372036854775807
        "#})
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("factor.trial_limit"));

        let mut config = AliquotConfig::default();
        config.factor.tuning.trial_limit = MAX_TRIAL_LIMIT;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_prime_policy_is_rejected() {
        let result = toml::from_str::<AliquotConfig>("[engine]\nprime_policy = \"halt\"\n");
        assert!(result.is_err());
    }
}
