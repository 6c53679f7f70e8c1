//! Import command - convert Cealing-Host lists

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use snirect_core::import::from_cealing_json;
use std::path::PathBuf;

/// Import command arguments
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Cealing-Host JSON list
    pub input: PathBuf,

    /// TOML rule file to write
    pub output: PathBuf,
}

/// Execute import command
pub fn execute(args: ImportArgs) -> Result<()> {
    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let import = from_cealing_json(&content)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;

    std::fs::write(&args.output, import.to_toml()?)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "{} Converted {} entries to {}",
        "✓".green(),
        import.rows,
        args.output.display().to_string().cyan()
    );
    println!("  alter_hostname: {}", import.rules.alter_hostname_rules().len());
    println!("  hosts: {}", import.rules.host_rules().len());

    Ok(())
}
