mod cli;
mod commands;
mod config;
mod paths;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, OverrideArgs};
use config::Overrides;
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };
    let overrides = overrides(cli.overrides);
    let config = cli.config.as_deref();

    match cli.command {
        Command::Validate => {
            let loaded = commands::load(config, overrides)?;
            commands::validate::run(&ctx, &loaded)?;
        }
        Command::Plan(args) => {
            let loaded = commands::load(config, overrides)?;
            commands::plan::run(&ctx, &loaded, &args)?;
        }
        Command::Synth(args) => {
            let loaded = commands::load(config, overrides)?;
            commands::synth::run(&ctx, &loaded, &args)?;
        }
        Command::Diff(args) => {
            let loaded = commands::load(config, overrides)?;
            let changed = commands::diff::run(&ctx, &loaded, &args)?;
            if changed && args.exit_code {
                return Ok(ExitCode::from(2));
            }
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "guardrails", &mut io::stdout());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn overrides(args: OverrideArgs) -> Overrides {
    Overrides {
        role_arn: args.role_arn,
        home_region: args.region,
        max_concurrency: args.max_concurrency,
        strategy: args.strategy.map(Into::into),
    }
}

/// Print the error chain, then what to do about it
fn report(err: &anyhow::Error) {
    ui::error(&format!("{err:#}"));

    let category = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<controltower::Error>())
        .map(controltower::Error::category);
    if let Some(category) = category {
        eprintln!("  {}: {}", category.description(), category.advice());
    }
}
