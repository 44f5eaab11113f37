use super::build_engine;
use crate::aliquotmap_error::AliquotError;
use crate::config::AliquotConfig;
use crate::io::{create_writer, parse_natural, OutputFormat, SequenceRecord};
use crate::observability::{set_current_seed, set_phase, RunPhase};
use crate::sequence::{PrimePolicy, SequenceOutcome};
use anyhow::Result;
use std::io::Write;

/// Options for `aliquotmap run`.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub seed: String,
    /// Step budget; `None` uses `engine.max_steps`.
    pub steps: Option<u64>,
    pub trace: bool,
    pub format: OutputFormat,
    pub stop_at_prime: bool,
    pub settings: AliquotConfig,
}

/// Iterate one seed and write its record to `out`.
pub fn run_seed<W: Write>(config: RunConfig, mut out: W) -> Result<SequenceOutcome> {
    let seed = parse_natural(&config.seed)
        .map_err(|_| AliquotError::cli_invalid_arg(&config.seed, "seed must be a non-negative integer"))?;

    let mut settings = config.settings;
    if config.stop_at_prime {
        settings.engine.prime_policy = PrimePolicy::StopAtPrime;
    }
    settings.engine.record_trajectory = config.trace;
    let max_steps = config.steps.unwrap_or(settings.engine.max_steps);

    let outcome = {
        let _phase = set_phase(RunPhase::Iterating);
        let _seed = set_current_seed(&seed);
        let mut engine = build_engine(&settings, 0);
        let outcome = engine
            .run_with_limit(&seed, max_steps)
            .map_err(|e| AliquotError::engine(&e, Some(seed.clone())))?;
        tracing::debug!(stats = ?engine.factorizer().stats(), "factorizer counters");
        outcome
    };

    let _phase = set_phase(RunPhase::OutputGeneration);
    if let Some(values) = &outcome.trajectory {
        for (step, value) in values.iter().enumerate() {
            writeln!(out, "{}\t{}", step, value)?;
        }
    }
    {
        let mut writer = create_writer(config.format, Box::new(&mut out));
        writer.write_record(&SequenceRecord::from_outcome(&outcome))?;
        writer.finish()?;
    }
    Ok(outcome)
}
