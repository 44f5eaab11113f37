//! Line-delimited JSON records read and written by the front ends.
//!
//! Naturals travel as decimal strings. On input a seed may also be a bare
//! JSON integer of any size; `serde_json` keeps the digits intact because the
//! crate enables its `arbitrary_precision` feature.

use crate::aliquotmap_error::AliquotError;
use crate::math::Natural;
use crate::sequence::{Ending, SequenceOutcome};
use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use std::io::BufRead;
use tracing::warn;

/// Parse a non-negative decimal integer with no sign, separators or exponent.
pub fn parse_natural(text: &str) -> Result<Natural, AliquotError> {
    let digits = text.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AliquotError::parse_natural(digits));
    }
    Natural::parse_bytes(digits.as_bytes(), 10).ok_or_else(|| AliquotError::parse_natural(digits))
}

/// Read a natural from a JSON string or integer.
pub fn natural_from_value(value: &Value) -> Result<Natural, AliquotError> {
    match value {
        Value::String(s) => parse_natural(s),
        Value::Number(n) => parse_natural(&n.to_string()),
        other => Err(AliquotError::parse_natural(other.to_string())),
    }
}

fn count_from_value(value: &Value) -> Result<u64, AliquotError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| AliquotError::parse_natural(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| AliquotError::parse_natural(s)),
        other => Err(AliquotError::parse_natural(other.to_string())),
    }
}

fn field<'a>(object: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| object.get(*name))
        .filter(|value| !value.is_null())
}

fn required<'a>(object: &'a Value, names: &[&str]) -> Result<&'a Value, String> {
    field(object, names).ok_or_else(|| format!("missing field `{}`", names[0]))
}

/// One seed to run, with its own step budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRequest {
    pub seed: Natural,
    pub steps: u64,
}

impl SeedRequest {
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let seed = natural_from_value(required(value, &["seed"])?)
            .map_err(|e| format!("seed: {}", e.message()))?;
        let steps = count_from_value(required(value, &["steps"])?)
            .map_err(|e| format!("steps: {}", e.message()))?;
        Ok(Self { seed, steps })
    }
}

/// A previously reported result, as read back for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedRecord {
    pub seed: Natural,
    pub steps: u64,
    pub ended: Option<Ending>,
    pub peak_bits: Option<u64>,
    pub peak: Option<Natural>,
}

impl ReportedRecord {
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let seed = natural_from_value(required(value, &["seed"])?)
            .map_err(|e| format!("seed: {}", e.message()))?;
        let steps = count_from_value(required(value, &["steps", "steps_done"])?)
            .map_err(|e| format!("steps: {}", e.message()))?;
        let ended = field(value, &["ended"])
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| "ended: expected a string".to_string())?
                    .parse::<Ending>()
                    .map_err(|e| format!("ended: {}", e))
            })
            .transpose()?;
        let peak_bits = field(value, &["peak_bits", "bits"])
            .map(|v| count_from_value(v).map_err(|e| format!("peak_bits: {}", e.message())))
            .transpose()?;
        let peak = field(value, &["peak", "max_value"])
            .map(|v| natural_from_value(v).map_err(|e| format!("peak: {}", e.message())))
            .transpose()?;
        Ok(Self {
            seed,
            steps,
            ended,
            peak_bits,
            peak,
        })
    }
}

/// A parsed line and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numbered<T> {
    /// 1-based line number in the input.
    pub line: usize,
    pub record: T,
}

/// Parsed records plus the number of lines that were skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonlInput<T> {
    pub records: Vec<Numbered<T>>,
    pub skipped: usize,
}

/// Read JSONL, skipping blank lines and warning about malformed ones.
///
/// Only read failures are errors; a bad line never stops the scan.
pub fn read_jsonl<T, R, F>(reader: R, parse: F) -> anyhow::Result<JsonlInput<T>>
where
    R: BufRead,
    F: Fn(&Value) -> Result<T, String>,
{
    let mut records = Vec::new();
    let mut skipped = 0;

    for (index, raw) in reader.split(b'\n').enumerate() {
        let line_no = index + 1;
        let raw = raw.with_context(|| format!("Failed to read input line {}", line_no))?;
        let line = match String::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => {
                let err = AliquotError::parse_record(e.to_string(), line_no);
                warn!(line = line_no, "skipping malformed record: {}", err);
                skipped += 1;
                continue;
            }
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let parsed = serde_json::from_str::<Value>(text)
            .map_err(|e| e.to_string())
            .and_then(|value| {
                if value.is_object() {
                    parse(&value)
                } else {
                    Err("expected a JSON object".to_string())
                }
            });

        match parsed {
            Ok(record) => records.push(Numbered {
                line: line_no,
                record,
            }),
            Err(reason) => {
                let err = AliquotError::parse_record(reason, line_no);
                warn!(line = line_no, "skipping malformed record: {}", err);
                skipped += 1;
            }
        }
    }

    Ok(JsonlInput { records, skipped })
}

/// Columns of the flat output formats, in order.
pub const RECORD_COLUMNS: [&str; 11] = [
    "seed",
    "steps",
    "ended",
    "final",
    "peak",
    "peak_step",
    "peak_bits",
    "status",
    "peak_prefix",
    "peak_hash",
    "wall_us",
];

/// One output record per seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceRecord {
    pub seed: String,
    pub steps: u64,
    pub ended: Ending,
    #[serde(rename = "final")]
    pub final_value: String,
    pub peak: String,
    pub peak_step: u64,
    pub peak_bits: u64,
    pub status: String,
    pub peak_prefix: String,
    pub peak_hash: String,
    pub wall_us: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trajectory: Option<Vec<String>>,
}

impl SequenceRecord {
    pub fn from_outcome(outcome: &SequenceOutcome) -> Self {
        Self {
            seed: outcome.seed.to_str_radix(10),
            steps: outcome.steps,
            ended: outcome.ending,
            final_value: outcome.final_value.to_str_radix(10),
            peak: outcome.peak.value.to_str_radix(10),
            peak_step: outcome.peak.step,
            peak_bits: outcome.peak_bits(),
            status: outcome.status().to_string(),
            peak_prefix: outcome.peak.prefix(),
            peak_hash: outcome.peak.fingerprint(),
            wall_us: u64::try_from(outcome.elapsed.as_micros()).unwrap_or(u64::MAX),
            trajectory: outcome
                .trajectory
                .as_ref()
                .map(|values| values.iter().map(|v| v.to_str_radix(10)).collect()),
        }
    }

    /// Values in [`RECORD_COLUMNS`] order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.seed.clone(),
            self.steps.to_string(),
            self.ended.to_string(),
            self.final_value.clone(),
            self.peak.clone(),
            self.peak_step.to_string(),
            self.peak_bits.to_string(),
            self.status.clone(),
            self.peak_prefix.clone(),
            self.peak_hash.clone(),
            self.wall_us.to_string(),
        ]
    }
}
