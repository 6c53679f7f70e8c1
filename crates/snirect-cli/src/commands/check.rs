//! Check command - parse and validate a rule file

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use snirect_core::{CertPolicy, Config, Format, RuleSet};
use std::path::PathBuf;

use crate::args::FormatArg;

/// Check command arguments
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Rule file to check
    pub file: PathBuf,

    /// File format (default: from extension)
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Host value accepted as a deletion marker (default: from config)
    #[arg(long, value_name = "MARKER")]
    pub marker: Option<String>,
}

/// Execute check command
pub fn execute(args: CheckArgs, config: &Config) -> Result<()> {
    let format = match args.format {
        Some(format) => format.into(),
        None => Format::from_path(&args.file)?,
    };

    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let rules = RuleSet::parse(&content, format)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;
    let marker = args
        .marker
        .as_deref()
        .unwrap_or(&config.rules.auto_marker);
    rules
        .validate_with_marker(marker)
        .context("Rule validation failed")?;

    println!("{} {} is valid", "✓".green(), args.file.display());
    println!("  Format: {format}");
    println!("  alter_hostname: {}", rules.alter_hostname_rules().len());
    println!("  cert_verify: {}", rules.cert_verify_rules().len());
    println!("  hosts: {}", rules.host_rules().len());

    for (pattern, raw) in rules.cert_verify_rules() {
        if CertPolicy::parse(raw).is_none() {
            println!(
                "  {} {}: unparsable certificate policy, verification will be disabled",
                "!".yellow(),
                pattern
            );
        }
    }

    Ok(())
}
