//! snirect-rules CLI
//!
//! Command-line interface for inspecting and maintaining SNI spoofing rules.

mod args;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use snirect_core::Config;
use tracing::error;

use args::Args;
use commands::Command;

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Logging settings may come from the config file
    let config = commands::config::load(args.config.as_deref())?;
    logging::init(&args, &config.logging)?;

    let result = run(args.command, &config);

    if let Err(ref e) = result {
        error!("Fatal error: {:#}", e);
    }

    result
}

fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Resolve(resolve_args) => commands::resolve::execute(resolve_args, config),
        Command::Check(check_args) => commands::check::execute(check_args, config),
        Command::Convert(convert_args) => commands::convert::execute(convert_args),
        Command::Import(import_args) => commands::import::execute(import_args),
        Command::Watch(watch_args) => commands::watch::execute(watch_args, config),
        Command::Config(config_args) => commands::config::execute(config_args, config),
    }
}
