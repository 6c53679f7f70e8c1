//! CLI commands

pub mod check;
pub mod config;
pub mod convert;
pub mod import;
pub mod resolve;
pub mod watch;

use clap::Subcommand;

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the SNI, address and certificate policy chosen for hostnames
    Resolve(resolve::ResolveArgs),

    /// Parse and validate a rule file
    Check(check::CheckArgs),

    /// Convert a rule file between TOML and JSON
    Convert(convert::ConvertArgs),

    /// Convert a Cealing-Host list into a TOML rule file
    Import(import::ImportArgs),

    /// Reload the configured rules whenever a rule file changes
    Watch(watch::WatchArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}
