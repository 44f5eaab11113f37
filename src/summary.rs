//! Aggregate counts over a batch.

use crate::math::{bit_length, Natural};
use crate::sequence::{SequenceOutcome, SequenceStatus};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub seeds: usize,
    pub terminated: usize,
    pub perfect: usize,
    pub amicable: usize,
    pub sociable: usize,
    /// Cycles entered after a pre-period.
    pub other_cycles: usize,
    pub open_limit: usize,
    /// Seeds whose run returned an error.
    pub failures: usize,
    /// Input lines skipped as malformed.
    pub skipped: usize,
    pub min_seed: Option<Natural>,
    pub max_seed: Option<Natural>,
    /// Largest peak and the seed that reached it first.
    pub largest_peak: Option<(Natural, Natural)>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, outcome: &SequenceOutcome) {
        self.seeds += 1;
        match outcome.status() {
            SequenceStatus::Terminated => self.terminated += 1,
            SequenceStatus::Perfect => self.perfect += 1,
            SequenceStatus::Amicable => self.amicable += 1,
            SequenceStatus::Sociable(_) => self.sociable += 1,
            SequenceStatus::Cycle => self.other_cycles += 1,
            SequenceStatus::OpenLimit => self.open_limit += 1,
        }

        if self.min_seed.as_ref().is_none_or(|min| outcome.seed < *min) {
            self.min_seed = Some(outcome.seed.clone());
        }
        if self.max_seed.as_ref().is_none_or(|max| outcome.seed > *max) {
            self.max_seed = Some(outcome.seed.clone());
        }
        let raises_peak = self
            .largest_peak
            .as_ref()
            .is_none_or(|(_, peak)| outcome.peak.value > *peak);
        if raises_peak {
            self.largest_peak = Some((outcome.seed.clone(), outcome.peak.value.clone()));
        }
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn record_skipped(&mut self, lines: usize) {
        self.skipped += lines;
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec!["metric", "value"]);

        let rows: [(&str, String); 9] = [
            ("seeds", self.seeds.to_string()),
            ("terminated", self.terminated.to_string()),
            ("perfect", self.perfect.to_string()),
            ("amicable", self.amicable.to_string()),
            ("sociable", self.sociable.to_string()),
            ("other cycles", self.other_cycles.to_string()),
            ("open (step limit)", self.open_limit.to_string()),
            ("failures", self.failures.to_string()),
            ("skipped lines", self.skipped.to_string()),
        ];
        for (metric, value) in rows {
            table.add_row(vec![metric.to_string(), value]);
        }

        if let (Some(min), Some(max)) = (&self.min_seed, &self.max_seed) {
            table.add_row(vec!["seed range".to_string(), format!("{}..={}", min, max)]);
        }
        if let Some((seed, peak)) = &self.largest_peak {
            table.add_row(vec![
                "largest peak".to_string(),
                format!("{} bits (seed {})", bit_length(peak), seed),
            ]);
        }
        table
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{Ending, PeakRecord};
    use std::time::Duration;

    fn outcome(seed: u32, ending: Ending, final_value: u32, peak: u32) -> SequenceOutcome {
        SequenceOutcome {
            seed: Natural::from(seed),
            steps: 1,
            ending,
            final_value: Natural::from(final_value),
            peak: PeakRecord::new(Natural::from(peak), 0),
            trajectory: None,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_counts_by_status() {
        let mut summary = BatchSummary::new();
        summary.observe(&outcome(6, Ending::Cycle(1), 6, 6));
        summary.observe(&outcome(220, Ending::Cycle(2), 220, 284));
        summary.observe(&outcome(25, Ending::Cycle(1), 6, 25));
        summary.observe(&outcome(10, Ending::Terminated, 1, 10));
        summary.observe(&outcome(276, Ending::StepLimitReached, 9, 1000));
        summary.record_failure();
        summary.record_skipped(2);

        assert_eq!(summary.seeds, 5);
        assert_eq!(summary.perfect, 1);
        assert_eq!(summary.amicable, 1);
        assert_eq!(summary.other_cycles, 1);
        assert_eq!(summary.terminated, 1);
        assert_eq!(summary.open_limit, 1);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.min_seed, Some(Natural::from(6u32)));
        assert_eq!(summary.max_seed, Some(Natural::from(276u32)));
        assert_eq!(
            summary.largest_peak,
            Some((Natural::from(276u32), Natural::from(1000u32)))
        );
    }

    #[test]
    fn test_peak_ties_keep_first_seed() {
        let mut summary = BatchSummary::new();
        summary.observe(&outcome(12, Ending::Terminated, 1, 16));
        summary.observe(&outcome(16, Ending::Terminated, 1, 16));
        assert_eq!(summary.largest_peak.unwrap().0, Natural::from(12u32));
    }

    #[test]
    fn test_display_lists_range() {
        let mut summary = BatchSummary::new();
        summary.observe(&outcome(12, Ending::Terminated, 1, 16));
        let text = summary.to_string();
        assert!(text.contains("12..=12"), "{}", text);
        assert!(text.contains("5 bits (seed 12)"), "{}", text);
    }
}
