//! `aliquotmap batch`: iterate every seed of a JSONL file.
//!
//! Records are parsed up front, then handed to rayon in chunks of
//! `parallel.batch_size`. Each record gets its own engine and random stream,
//! so results do not depend on scheduling. Without `--sort`, output is
//! written chunk by chunk in input order.

use super::build_engine;
use crate::aliquotmap_error::AliquotError;
use crate::config::AliquotConfig;
use crate::io::{
    create_writer, open_input, open_output, parse_natural, read_jsonl, Numbered, OutputFormat,
    RecordWriter, SeedRequest, SequenceRecord,
};
use crate::observability::{
    increment_processed, set_current_line, set_current_seed, set_phase, set_progress, RunPhase,
};
use crate::progress::{ProgressConfig, ProgressManager, TEMPLATE_SEEDS};
use crate::sequence::SequenceOutcome;
use crate::summary::BatchSummary;
use anyhow::Result;
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::path::PathBuf;
use tracing::{info, info_span, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Seed,
    Steps,
    Peak,
    PeakBits,
}

impl SortField {
    fn compare(self, a: &SequenceOutcome, b: &SequenceOutcome) -> Ordering {
        match self {
            Self::Seed => a.seed.cmp(&b.seed),
            Self::Steps => a.steps.cmp(&b.steps),
            Self::Peak => a.peak.value.cmp(&b.peak.value),
            Self::PeakBits => a.peak_bits().cmp(&b.peak_bits()),
        }
    }
}

/// Options for `aliquotmap batch`.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub step_limit: Option<u64>,
    pub max_seeds: Option<usize>,
    /// Only records with this seed (decimal).
    pub only_seed: Option<String>,
    pub sort: Option<SortField>,
    pub descending: bool,
    pub summary: bool,
    pub quiet: bool,
    pub verbosity: u8,
    pub settings: AliquotConfig,
}

/// What a batch did.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub summary: BatchSummary,
}

/// Run a batch, writing records to `--output` or stdout.
pub fn run_batch(config: BatchConfig) -> Result<BatchReport> {
    let out = open_output(config.output.as_deref())?;
    let mut writer = create_writer(config.format, out);
    let report = run_batch_into(&config, writer.as_mut())?;

    if config.summary {
        eprintln!("{}", report.summary);
    }
    Ok(report)
}

/// Run a batch into an existing writer and finish it.
pub fn run_batch_into(config: &BatchConfig, writer: &mut dyn RecordWriter) -> Result<BatchReport> {
    let span = info_span!("batch", input = %config.input.display());
    let _enter = span.enter();

    let progress = ProgressManager::new(ProgressConfig::from_env(config.quiet, config.verbosity));
    let mut summary = BatchSummary::new();
    let reading = progress.create_spinner("Reading seeds");
    let requests = load_requests(config, &mut summary)?;
    reading.finish_and_clear();

    set_progress(0, requests.len());
    let bar = progress.create_bar(requests.len() as u64, TEMPLATE_SEEDS);
    bar.set_message("Iterating");

    let settings = &config.settings;
    let chunk_size = settings.parallel.effective_batch_size().max(1);
    let mut held: Vec<SequenceOutcome> = Vec::new();

    for chunk in requests.chunks(chunk_size) {
        let results = run_chunk(settings, config.step_limit, chunk, &bar);

        let _phase = set_phase(RunPhase::OutputGeneration);
        for (request, result) in chunk.iter().zip(results) {
            match result {
                Ok(outcome) => {
                    summary.observe(&outcome);
                    if config.sort.is_some() {
                        held.push(outcome);
                    } else {
                        writer.write_record(&SequenceRecord::from_outcome(&outcome))?;
                    }
                }
                Err(err) => {
                    warn!(line = request.line, seed = %request.record.seed, "record failed: {}", err);
                    summary.record_failure();
                }
            }
        }
    }

    if let Some(field) = config.sort {
        let _phase = set_phase(RunPhase::OutputGeneration);
        sort_outcomes(&mut held, field, config.descending);
        for outcome in &held {
            writer.write_record(&SequenceRecord::from_outcome(outcome))?;
        }
    }
    writer.finish()?;
    bar.finish_and_clear();

    info!(
        seeds = summary.seeds,
        failures = summary.failures,
        skipped = summary.skipped,
        "batch complete"
    );
    Ok(BatchReport { summary })
}

fn load_requests(
    config: &BatchConfig,
    summary: &mut BatchSummary,
) -> Result<Vec<Numbered<SeedRequest>>> {
    let _phase = set_phase(RunPhase::InputParsing);

    let only_seed = config
        .only_seed
        .as_deref()
        .map(|s| {
            parse_natural(s)
                .map_err(|_| AliquotError::cli_invalid_arg(s, "seed must be a non-negative integer"))
        })
        .transpose()?;

    let input = read_jsonl(open_input(&config.input)?, SeedRequest::from_value)?;
    summary.record_skipped(input.skipped);

    let mut requests: Vec<_> = input
        .records
        .into_iter()
        .filter(|r| only_seed.as_ref().is_none_or(|seed| r.record.seed == *seed))
        .collect();
    if let Some(max) = config.max_seeds {
        requests.truncate(max);
    }
    info!(records = requests.len(), skipped = input.skipped, "parsed input");
    Ok(requests)
}

fn run_chunk(
    settings: &AliquotConfig,
    step_limit: Option<u64>,
    chunk: &[Numbered<SeedRequest>],
    bar: &ProgressBar,
) -> Vec<Result<SequenceOutcome, AliquotError>> {
    let run_one = |request: &Numbered<SeedRequest>| {
        let result = run_request(settings, step_limit, request);
        increment_processed();
        bar.inc(1);
        result
    };

    if settings.parallel.enabled {
        chunk.par_iter().map(run_one).collect()
    } else {
        chunk.iter().map(run_one).collect()
    }
}

fn run_request(
    settings: &AliquotConfig,
    step_limit: Option<u64>,
    request: &Numbered<SeedRequest>,
) -> Result<SequenceOutcome, AliquotError> {
    let _phase = set_phase(RunPhase::Iterating);
    let _line = set_current_line(request.line);
    let _seed = set_current_seed(&request.record.seed);

    let budget = effective_budget(request.record.steps, step_limit);
    // Streams follow the input line, so filtering never changes a record's stream.
    let mut engine = build_engine(settings, request.line as u64);
    engine
        .run_with_limit(&request.record.seed, budget)
        .map_err(|e| AliquotError::engine(&e, Some(request.record.seed.clone())))
}

/// A record's own budget, capped by `--step-limit`.
pub fn effective_budget(requested: u64, step_limit: Option<u64>) -> u64 {
    step_limit.map_or(requested, |limit| requested.min(limit))
}

/// Sort with ties broken by seed, so equal keys keep a stable order.
pub fn sort_outcomes(outcomes: &mut [SequenceOutcome], field: SortField, descending: bool) {
    outcomes.sort_by(|a, b| {
        let primary = field.compare(a, b);
        let primary = if descending { primary.reverse() } else { primary };
        primary.then_with(|| a.seed.cmp(&b.seed))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Natural;
    use crate::sequence::{Ending, PeakRecord};
    use std::time::Duration;

    fn outcome(seed: u32, steps: u64, peak: u32) -> SequenceOutcome {
        SequenceOutcome {
            seed: Natural::from(seed),
            steps,
            ending: Ending::Terminated,
            final_value: Natural::from(1u32),
            peak: PeakRecord::new(Natural::from(peak), 0),
            trajectory: None,
            elapsed: Duration::ZERO,
        }
    }

    fn seeds(outcomes: &[SequenceOutcome]) -> Vec<String> {
        outcomes.iter().map(|o| o.seed.to_string()).collect()
    }

    #[test]
    fn test_effective_budget() {
        assert_eq!(effective_budget(100, None), 100);
        assert_eq!(effective_budget(100, Some(10)), 10);
        assert_eq!(effective_budget(5, Some(10)), 5);
    }

    #[test]
    fn test_sort_by_peak_descending_breaks_ties_by_seed() {
        let mut outcomes = vec![outcome(30, 1, 50), outcome(10, 4, 900), outcome(20, 2, 50)];
        sort_outcomes(&mut outcomes, SortField::Peak, true);
        assert_eq!(seeds(&outcomes), vec!["10", "20", "30"]);
    }

    #[test]
    fn test_sort_by_steps_ascending() {
        let mut outcomes = vec![outcome(30, 9, 1), outcome(10, 4, 1), outcome(20, 2, 1)];
        sort_outcomes(&mut outcomes, SortField::Steps, false);
        assert_eq!(seeds(&outcomes), vec!["20", "10", "30"]);
    }

    #[test]
    fn test_sort_by_peak_bits_groups_equal_widths() {
        // 900 and 1000 are both 10 bits wide
        let mut outcomes = vec![outcome(3, 1, 1000), outcome(2, 1, 900), outcome(1, 1, 40)];
        sort_outcomes(&mut outcomes, SortField::PeakBits, true);
        assert_eq!(seeds(&outcomes), vec!["2", "3", "1"]);
    }
}
