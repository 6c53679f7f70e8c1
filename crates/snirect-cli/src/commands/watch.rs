//! Watch command - keep rules current while rule files change

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use snirect_core::{Config, Layers, RuleStore};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Watch command arguments
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Hostnames to resolve again after every reload
    pub hosts: Vec<String>,

    /// Poll interval in seconds (default: from config)
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,
}

/// Execute watch command
pub fn execute(args: WatchArgs, config: &Config) -> Result<()> {
    let interval = args.interval.unwrap_or(config.watch.interval_secs);
    if interval == 0 {
        bail!("Poll interval must be greater than 0");
    }

    let layers = config.layers()?;
    let store = RuleStore::from_layers(&layers).context("Failed to load rules")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(watch(&store, &layers, &args.hosts, Duration::from_secs(interval)))
}

async fn watch(store: &RuleStore, layers: &Layers, hosts: &[String], every: Duration) -> Result<()> {
    info!(layers = layers.len(), interval = ?every, "Watching rule sources");
    report(store, hosts);

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately
    ticker.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match store.reload_if_changed(layers) {
                    Ok(true) => report(store, hosts),
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "Rule reload failed, keeping previous rules"),
                }
            }
            result = &mut shutdown => {
                result.context("Failed to listen for interrupt signal")?;
                info!("Received interrupt signal, shutting down...");
                break;
            }
        }
    }

    Ok(())
}

fn report(store: &RuleStore, hosts: &[String]) {
    let rules = store.snapshot();
    println!(
        "{} generation {} ({} rules)",
        "●".green(),
        store.generation(),
        rules.len()
    );

    for host in hosts {
        let decision = rules.decide(host);
        println!(
            "  {} -> {}",
            decision.host.cyan(),
            decision.sni.as_deref().unwrap_or("-")
        );
    }
}
