//! Resolve command - show the decision for hostnames

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use snirect_core::{Config, Decision};
use std::path::PathBuf;

/// Resolve command arguments
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Hostnames to resolve
    #[arg(required = true)]
    pub hosts: Vec<String>,

    /// Extra base rule file, merged after the configured ones
    #[arg(long, value_name = "FILE")]
    pub base: Vec<PathBuf>,

    /// Extra override rule file, applied after the configured ones
    #[arg(long = "override", value_name = "FILE")]
    pub overrides: Vec<PathBuf>,

    /// Leave out the embedded rules
    #[arg(long)]
    pub no_builtin: bool,

    /// Override value that deletes an inherited rule
    #[arg(long, value_name = "MARKER")]
    pub marker: Option<String>,

    /// Print one JSON object per hostname
    #[arg(long)]
    pub json: bool,
}

/// Execute resolve command
pub fn execute(args: ResolveArgs, config: &Config) -> Result<()> {
    let mut config = config.clone();
    if args.no_builtin {
        config.rules.builtin = false;
    }
    config.rules.base.extend(args.base);
    config.rules.overrides.extend(args.overrides);
    if let Some(marker) = args.marker {
        config.rules.auto_marker = marker;
    }
    config.validate().context("Invalid rule configuration")?;

    let rules = config
        .layers()?
        .build()
        .context("Failed to load rules")?;

    for host in &args.hosts {
        let decision = rules.decide(host);
        if args.json {
            println!("{}", serde_json::to_string(&decision)?);
        } else {
            print_decision(&decision);
        }
    }

    Ok(())
}

fn print_decision(decision: &Decision) {
    let none = || "-".dimmed().to_string();

    println!("{}", decision.host.cyan().bold());
    println!(
        "  sni   {}",
        decision.sni.as_ref().map_or_else(none, |sni| sni.green().to_string())
    );
    println!(
        "  addr  {}",
        decision.addr.as_ref().map_or_else(none, |addr| addr.green().to_string())
    );
    println!(
        "  cert  {}",
        decision.cert.as_ref().map_or_else(none, |cert| match cert.mode() {
            snirect_core::VerifyMode::Disabled => cert.to_string().yellow().to_string(),
            _ => cert.to_string().green().to_string(),
        })
    );
}
