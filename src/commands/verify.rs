//! `aliquotmap verify`: recompute reported records and compare.
//!
//! Each record is rerun with its own reported step count as the budget, so a
//! correct report reproduces exactly. The TSV report keeps every record;
//! mismatches are flagged in the `match_*` columns and the note.

use super::build_engine;
use crate::aliquotmap_error::AliquotError;
use crate::config::AliquotConfig;
use crate::io::{open_input, open_output, read_jsonl, Numbered, ReportedRecord};
use crate::observability::{
    increment_processed, set_current_line, set_current_seed, set_phase, set_progress, RunPhase,
};
use crate::progress::{ProgressConfig, ProgressManager, TEMPLATE_SEEDS};
use crate::sequence::{Ending, SequenceOutcome};
use anyhow::Result;
use num_traits::Zero;
use rayon::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Runs slower than this get a `slow_<secs>s;` note.
const SLOW_THRESHOLD: Duration = Duration::from_secs(1);

pub const VERIFY_COLUMNS: [&str; 14] = [
    "seed",
    "reported_steps",
    "reported_bits",
    "reported_ended",
    "steps",
    "ended",
    "final",
    "peak",
    "peak_step",
    "peak_bits",
    "match_bits",
    "match_ended",
    "match_peak",
    "note",
];

/// Options for `aliquotmap verify`.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub max_steps: Option<u64>,
    pub max_seeds: Option<usize>,
    pub strict: bool,
    pub quiet: bool,
    pub verbosity: u8,
    pub settings: AliquotConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub verified: usize,
    pub mismatches: usize,
    pub failures: usize,
    pub skipped: usize,
}

/// Comparison of one reported record with its recomputation.
///
/// A `None` match means the report did not carry that field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub match_bits: Option<bool>,
    pub match_ended: Option<bool>,
    pub match_peak: Option<bool>,
    pub note: String,
}

impl Comparison {
    pub fn compare(reported: &ReportedRecord, outcome: &SequenceOutcome) -> Self {
        let match_bits = reported.peak_bits.map(|bits| bits == outcome.peak_bits());
        let match_ended = reported.ended.map(|ended| endings_agree(ended, outcome.ending));
        let match_peak = reported.peak.as_ref().map(|peak| *peak == outcome.peak.value);

        let mut note = String::new();
        if match_bits == Some(false) {
            note.push_str("bits_mismatch;");
        }
        if match_ended == Some(false) {
            note.push_str("ended_mismatch;");
        }
        if match_peak == Some(false) {
            note.push_str("peak_mismatch;");
        }
        if outcome.elapsed > SLOW_THRESHOLD {
            note.push_str(&format!("slow_{:.2}s;", outcome.elapsed.as_secs_f64()));
        }

        Self {
            match_bits,
            match_ended,
            match_peak,
            note,
        }
    }

    pub fn is_mismatch(&self) -> bool {
        [self.match_bits, self.match_ended, self.match_peak].contains(&Some(false))
    }
}

/// Any two cycles agree: reporters have measured cycle length differently.
fn endings_agree(reported: Ending, computed: Ending) -> bool {
    reported == computed || (reported.is_cycle() && computed.is_cycle())
}

fn flag(value: Option<bool>) -> String {
    match value {
        Some(true) => "1".to_string(),
        Some(false) => "0".to_string(),
        None => String::new(),
    }
}

fn report_row(
    reported: &ReportedRecord,
    outcome: &SequenceOutcome,
    cmp: &Comparison,
) -> Vec<String> {
    vec![
        reported.seed.to_string(),
        reported.steps.to_string(),
        reported.peak_bits.map(|b| b.to_string()).unwrap_or_default(),
        reported.ended.map(|e| e.to_string()).unwrap_or_default(),
        outcome.steps.to_string(),
        outcome.ending.to_string(),
        outcome.final_value.to_string(),
        outcome.peak.value.to_string(),
        outcome.peak.step.to_string(),
        outcome.peak_bits().to_string(),
        flag(cmp.match_bits),
        flag(cmp.match_ended),
        flag(cmp.match_peak),
        cmp.note.clone(),
    ]
}

/// Verify to `--output` or stdout. With `--strict`, mismatches are an error.
pub fn verify_records(config: VerifyConfig) -> Result<VerifyReport> {
    let out = open_output(config.output.as_deref())?;
    let report = verify_into(&config, out)?;

    eprintln!(
        "verified {} record(s): {} mismatch(es), {} failure(s), {} skipped",
        report.verified, report.mismatches, report.failures, report.skipped
    );
    if config.strict && (report.mismatches > 0 || report.failures > 0) {
        return Err(AliquotError::mismatches(vec![format!(
            "{} mismatch(es) and {} failure(s) in {}",
            report.mismatches,
            report.failures,
            config.input.display()
        )])
        .into());
    }
    Ok(report)
}

/// Verify into an arbitrary writer as TSV.
pub fn verify_into<W: Write>(config: &VerifyConfig, out: W) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();
    let progress = ProgressManager::new(ProgressConfig::from_env(config.quiet, config.verbosity));

    let records = {
        let reading = progress.create_spinner("Reading reports");
        let _phase = set_phase(RunPhase::InputParsing);
        let input = read_jsonl(open_input(&config.input)?, ReportedRecord::from_value)?;
        report.skipped = input.skipped;

        let mut records: Vec<_> = input
            .records
            .into_iter()
            .filter(|r| {
                let keep = !r.record.seed.is_zero();
                if !keep {
                    info!(line = r.line, "skipping seed 0");
                }
                keep
            })
            .collect();
        if let Some(max) = config.max_seeds {
            records.truncate(max);
        }
        reading.finish_and_clear();
        records
    };

    set_progress(0, records.len());
    let bar = progress.create_bar(records.len() as u64, TEMPLATE_SEEDS);
    bar.set_message("Verifying");

    let run_one = |record: &Numbered<ReportedRecord>| {
        let result = recompute(config, record);
        increment_processed();
        bar.inc(1);
        result
    };
    let outcomes: Vec<_> = if config.settings.parallel.enabled {
        records.par_iter().map(run_one).collect()
    } else {
        records.iter().map(run_one).collect()
    };

    let _phase = set_phase(RunPhase::OutputGeneration);
    let mut tsv = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
    tsv.write_record(VERIFY_COLUMNS)?;
    for (record, outcome) in records.iter().zip(outcomes) {
        match outcome {
            Ok(outcome) => {
                let cmp = Comparison::compare(&record.record, &outcome);
                if cmp.is_mismatch() {
                    warn!(line = record.line, seed = %record.record.seed, note = %cmp.note, "mismatch");
                    report.mismatches += 1;
                }
                tsv.write_record(report_row(&record.record, &outcome, &cmp))?;
                report.verified += 1;
            }
            Err(err) => {
                warn!(line = record.line, seed = %record.record.seed, "recompute failed: {}", err);
                report.failures += 1;
            }
        }
    }
    tsv.flush()?;
    bar.finish_and_clear();
    Ok(report)
}

fn recompute(
    config: &VerifyConfig,
    record: &Numbered<ReportedRecord>,
) -> Result<SequenceOutcome, AliquotError> {
    let _phase = set_phase(RunPhase::Verification);
    let _line = set_current_line(record.line);
    let _seed = set_current_seed(&record.record.seed);

    let budget = config
        .max_steps
        .map_or(record.record.steps, |cap| record.record.steps.min(cap));
    let mut engine = build_engine(&config.settings, record.line as u64);
    engine
        .run_with_limit(&record.record.seed, budget)
        .map_err(|e| AliquotError::engine(&e, Some(record.record.seed.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Natural;
    use crate::sequence::PeakRecord;

    fn outcome(ending: Ending, peak: u32, elapsed: Duration) -> SequenceOutcome {
        SequenceOutcome {
            seed: Natural::from(220u32),
            steps: 2,
            ending,
            final_value: Natural::from(220u32),
            peak: PeakRecord::new(Natural::from(peak), 1),
            trajectory: None,
            elapsed,
        }
    }

    fn reported(bits: Option<u64>, ended: Option<Ending>, peak: Option<u32>) -> ReportedRecord {
        ReportedRecord {
            seed: Natural::from(220u32),
            steps: 2,
            ended,
            peak_bits: bits,
            peak: peak.map(Natural::from),
        }
    }

    #[test]
    fn test_full_agreement() {
        let cmp = Comparison::compare(
            &reported(Some(9), Some(Ending::Cycle(2)), Some(284)),
            &outcome(Ending::Cycle(2), 284, Duration::ZERO),
        );
        assert!(!cmp.is_mismatch());
        assert_eq!(cmp.note, "");
    }

    #[test]
    fn test_notes_accumulate() {
        let cmp = Comparison::compare(
            &reported(Some(12), Some(Ending::Terminated), Some(300)),
            &outcome(Ending::Cycle(2), 284, Duration::from_millis(1500)),
        );
        assert!(cmp.is_mismatch());
        assert_eq!(cmp.note, "bits_mismatch;ended_mismatch;peak_mismatch;slow_1.50s;");
    }

    #[test]
    fn test_missing_fields_are_not_mismatches() {
        let cmp = Comparison::compare(
            &reported(None, None, None),
            &outcome(Ending::Terminated, 284, Duration::ZERO),
        );
        assert_eq!(cmp.match_bits, None);
        assert!(!cmp.is_mismatch());
        assert_eq!(flag(cmp.match_peak), "");
    }

    #[test]
    fn test_cycles_of_any_length_agree() {
        assert!(endings_agree(Ending::Cycle(2), Ending::Cycle(1)));
        assert!(!endings_agree(Ending::Cycle(2), Ending::StepLimitReached));
    }
}
