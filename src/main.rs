use aliquotmap::aliquotmap_error::AliquotError;
use aliquotmap::cli::{configure_thread_pool, resolve_jobs, Cli, Commands};
use aliquotmap::commands::{self, BatchConfig, RunConfig, VerifyConfig};
use aliquotmap::config::{self, AliquotConfig};
use aliquotmap::observability::{init_tracing, install_panic_hook, set_phase, RunPhase};
use aliquotmap::sequence::PrimePolicy;
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbosity);
    install_panic_hook();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<AliquotError>()
                .map_or(1, AliquotError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn load_settings(cli: &Cli) -> Result<AliquotConfig> {
    let _phase = set_phase(RunPhase::ConfigLoading);
    Ok(match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config(),
    })
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings(&cli)?;

    match cli.command {
        Commands::Run {
            seed,
            steps,
            trace,
            format,
            stop_at_prime,
        } => {
            let config = RunConfig {
                seed,
                steps,
                trace,
                format: format.into(),
                stop_at_prime,
                settings,
            };
            commands::run_seed(config, std::io::stdout().lock())?;
        }
        Commands::Batch {
            input,
            format,
            output,
            step_limit,
            max_seeds,
            seed,
            sort,
            desc,
            jobs,
            summary,
            entropy,
            max_restarts,
            stop_at_prime,
        } => {
            if entropy {
                settings.factor.rng_seed = None;
            }
            if max_restarts.is_some() {
                settings.factor.tuning.max_restarts = max_restarts;
            }
            if stop_at_prime {
                settings.engine.prime_policy = PrimePolicy::StopAtPrime;
            }
            configure_thread_pool(resolve_jobs(jobs, &settings.parallel));

            let config = BatchConfig {
                input,
                output,
                format: format.into(),
                step_limit,
                max_seeds,
                only_seed: seed,
                sort: sort.map(Into::into),
                descending: desc,
                summary,
                quiet: cli.quiet,
                verbosity: cli.verbosity,
                settings,
            };
            commands::run_batch(config)?;
        }
        Commands::Verify {
            input,
            output,
            max_steps,
            max_seeds,
            strict,
            jobs,
        } => {
            configure_thread_pool(resolve_jobs(jobs, &settings.parallel));
            let config = VerifyConfig {
                input,
                output,
                max_steps,
                max_seeds,
                strict,
                quiet: cli.quiet,
                verbosity: cli.verbosity,
                settings,
            };
            commands::verify_records(config)?;
        }
        Commands::Factor { numbers } => {
            commands::factor_numbers(&numbers, &settings, std::io::stdout().lock())?;
        }
        Commands::Init { force } => {
            commands::init_config(force)?;
        }
    }
    Ok(())
}
