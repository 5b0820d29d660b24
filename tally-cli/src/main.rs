//! Tally CLI - Command-line runner for tally SQL migrations.

use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

use tally_cli::cli::{Cli, Command};
use tally_cli::commands;
use tally_cli::error::CliResult;
use tally_cli::output;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        output::newline();
        output::error(&e.to_string());
        if let Some(help) = e.help() {
            output::hint(&help.to_string());
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Migrate(args) => commands::migrate::run(args).await,
        Command::History(args) => commands::history::run(args).await,
        Command::Check(args) => commands::check::run(args).await,
        Command::Version => commands::version::run().await,
    }
}
