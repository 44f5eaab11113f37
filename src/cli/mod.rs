//! Command-line interface for aliquotmap.

pub mod setup;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub use setup::{configure_thread_pool, resolve_jobs};

#[derive(Parser, Debug)]
#[command(name = "aliquotmap")]
#[command(about = "Aliquot sequence explorer: iterate, classify and verify trajectories", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the nearest .aliquotmap.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Suppress progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Iterate a single seed
    Run {
        /// Starting value (decimal)
        seed: String,

        /// Step budget (defaults to engine.max_steps)
        #[arg(long)]
        steps: Option<u64>,

        /// Print every (step, value) pair before the record
        #[arg(long)]
        trace: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "jsonl")]
        format: FormatArg,

        /// Stop as soon as a step yields a prime
        #[arg(long)]
        stop_at_prime: bool,
    },

    /// Run every seed of a JSONL file
    Batch {
        /// JSONL input with `seed` and `steps` fields; `-` reads stdin
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "jsonl")]
        format: FormatArg,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Cap every record's step budget
        #[arg(long)]
        step_limit: Option<u64>,

        /// Process at most this many seeds
        #[arg(long)]
        max_seeds: Option<usize>,

        /// Only process records with this seed
        #[arg(long)]
        seed: Option<String>,

        /// Sort records before writing (default: input order)
        #[arg(long, value_enum)]
        sort: Option<SortKey>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Worker threads (0 = use config or all cores)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,

        /// Print a summary table to stderr when done
        #[arg(long)]
        summary: bool,

        /// Draw random streams from the OS instead of factor.rng_seed
        #[arg(long)]
        entropy: bool,

        /// Give up on a factorization after this many rho restarts
        #[arg(long)]
        max_restarts: Option<u32>,

        /// Stop as soon as a step yields a prime
        #[arg(long)]
        stop_at_prime: bool,
    },

    /// Recompute reported records and write a comparison TSV
    Verify {
        /// JSONL of previously reported records
        input: PathBuf,

        /// TSV report file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Cap the recomputed step budget
        #[arg(long)]
        max_steps: Option<u64>,

        /// Verify at most this many records
        #[arg(long)]
        max_seeds: Option<usize>,

        /// Exit with an error when any record mismatches
        #[arg(long)]
        strict: bool,

        /// Worker threads (0 = use config or all cores)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,
    },

    /// Factor numbers and print their divisor sums
    Factor {
        /// Decimal numbers to factor
        #[arg(required = true)]
        numbers: Vec<String>,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum FormatArg {
    Jsonl,
    Csv,
    Tsv,
    Table,
}

impl From<FormatArg> for crate::io::OutputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Jsonl => crate::io::OutputFormat::Jsonl,
            FormatArg::Csv => crate::io::OutputFormat::Csv,
            FormatArg::Tsv => crate::io::OutputFormat::Tsv,
            FormatArg::Table => crate::io::OutputFormat::Table,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum SortKey {
    Seed,
    Steps,
    Peak,
    PeakBits,
}

impl From<SortKey> for crate::commands::batch::SortField {
    fn from(key: SortKey) -> Self {
        use crate::commands::batch::SortField;
        match key {
            SortKey::Seed => SortField::Seed,
            SortKey::Steps => SortField::Steps,
            SortKey::Peak => SortField::Peak,
            SortKey::PeakBits => SortField::PeakBits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_run_command() {
        let cli = Cli::try_parse_from(["aliquotmap", "run", "276", "--steps", "50", "--trace"])
            .unwrap();
        match cli.command {
            Commands::Run {
                seed, steps, trace, ..
            } => {
                assert_eq!(seed, "276");
                assert_eq!(steps, Some(50));
                assert!(trace);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parsing_batch_command() {
        let cli = Cli::try_parse_from([
            "aliquotmap",
            "-vv",
            "batch",
            "seeds.jsonl",
            "--format",
            "tsv",
            "--sort",
            "peak-bits",
            "--desc",
            "--quiet",
        ])
        .unwrap();
        assert_eq!(cli.verbosity, 2);
        assert!(cli.quiet);
        match cli.command {
            Commands::Batch {
                input,
                format,
                sort,
                desc,
                jobs,
                ..
            } => {
                assert_eq!(input, PathBuf::from("seeds.jsonl"));
                assert_eq!(format, FormatArg::Tsv);
                assert_eq!(sort, Some(SortKey::PeakBits));
                assert!(desc);
                assert_eq!(jobs, 0);
            }
            _ => panic!("Expected Batch command"),
        }
    }

    #[test]
    fn test_desc_requires_sort() {
        assert!(Cli::try_parse_from(["aliquotmap", "batch", "in.jsonl", "--desc"]).is_err());
    }

    #[test]
    fn test_factor_requires_numbers() {
        assert!(Cli::try_parse_from(["aliquotmap", "factor"]).is_err());
    }

    #[test]
    fn test_cli_parsing_init_command() {
        let cli = Cli::try_parse_from(["aliquotmap", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Init { force } => assert!(force),
            _ => panic!("Expected Init command"),
        }
    }
}
