//! Campus warehouse CLI - medallion ETL into a DuckDB star schema

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod logging;

use cli::Cli;
use commands::common::ExitCode;
use commands::{archive, audit, deadlines, run};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = match &cli.command {
        cli::Commands::Run(args) => run::execute(args, &cli.global).await,
        cli::Commands::Deadlines(args) => deadlines::execute(args, &cli.global).await,
        cli::Commands::Audit(args) => audit::execute(args, &cli.global).await,
        cli::Commands::Archive(args) => archive::execute(args, &cli.global).await,
    };

    match result {
        Err(err) => match err.downcast_ref::<ExitCode>() {
            Some(code) => std::process::exit(code.0),
            None => Err(err),
        },
        Ok(()) => Ok(()),
    }
}
