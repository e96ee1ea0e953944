mod az;
mod board;
mod cli;
mod config;
mod error;
mod orchestrator;
mod query;
mod ui;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use az::{AzCli, AzClient, TermPrompter};
use cli::Cli;
use config::{AbConfig, Settings};
use error::AbError;
use orchestrator::{Body, BoardOrchestrator};

const LOG_ENV: &str = "AB_LOG";

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "ab=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = AbConfig::load()?;
    let settings = Settings::resolve(&config, &cli)?;
    tracing::debug!(
        policy = %settings.policy,
        columns = %settings.columns,
        po_order = settings.po_order,
        "settings resolved"
    );

    let az = AzClient::new(
        AzCli::new(!settings.silent),
        TermPrompter,
        settings.policy,
        settings.silent,
    );
    let report = BoardOrchestrator::new(az, settings).execute(&cli.command)?;

    for notice in &report.notices {
        ui::notice(notice);
    }
    match report.body {
        Body::Text(text) => print!("{text}"),
        Body::Raw(raw) => ui::print_json(&raw)?,
    }
    Ok(())
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    err.downcast_ref::<AbError>().is_some_and(AbError::is_cancelled)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if is_cancelled(&err) => {
            eprintln!("cancelled");
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
