//! Convert command - translate rule files between formats

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use snirect_core::format::JsonRules;
use snirect_core::{Format, RuleSet};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::args::FormatArg;

/// Convert command arguments
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Rule file to read
    pub input: PathBuf,

    /// Rule file to write
    pub output: PathBuf,

    /// Input format (default: from extension)
    #[arg(long, value_enum)]
    pub from: Option<FormatArg>,

    /// Output format (default: from extension)
    #[arg(long, value_enum)]
    pub to: Option<FormatArg>,
}

/// Execute convert command
pub fn execute(args: ConvertArgs) -> Result<()> {
    let from = detect(args.from, &args.input)?;
    let to = detect(args.to, &args.output)?;

    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let rules = RuleSet::parse(&content, from)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;

    let rendered = if to == Format::Json && args.output.exists() {
        // Keep the settings of an existing JSON document
        update_json(&args.output, &rules)?
    } else {
        rules.render(to)?
    };

    std::fs::write(&args.output, rendered)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!(input = %args.input.display(), output = %args.output.display(), %from, %to, "Converted rules");
    println!(
        "{} Converted {} rules to {}",
        "✓".green(),
        rules.len(),
        args.output.display().to_string().cyan()
    );

    Ok(())
}

fn detect(arg: Option<FormatArg>, path: &Path) -> Result<Format> {
    match arg {
        Some(format) => Ok(format.into()),
        None => Format::from_path(path).context("Use --from/--to to set the format"),
    }
}

fn update_json(path: &Path, rules: &RuleSet) -> Result<String> {
    let existing = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut document: JsonRules = serde_json::from_str(&existing)
        .with_context(|| format!("Failed to parse existing {}", path.display()))?;
    document.set_rules(rules);
    Ok(serde_json::to_string_pretty(&document)?)
}
