//! Logging initialization

use anyhow::{Context, Result};
use snirect_core::config::LoggingConfig;
use std::fs::File;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::args::{Args, LogFormat};

/// Initialize logging from CLI arguments, falling back to the config file
pub fn init(args: &Args, config: &LoggingConfig) -> Result<()> {
    let level = level(args, config)?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // Flags win over the config file
    let format = match args.log_format {
        LogFormat::Text if config.json_format => LogFormat::Json,
        format => format,
    };
    let log_file = args.log_file.as_ref().or(config.file.as_ref());
    let file = log_file
        .map(|path| {
            File::create(path).with_context(|| format!("Failed to create log file: {path}"))
        })
        .transpose()?;

    // Diagnostics go to stderr so command output stays pipeable
    match format {
        LogFormat::Text => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(args.verbose >= 2)
                    .with_thread_ids(args.verbose >= 3)
                    .with_file(args.verbose >= 3)
                    .with_line_number(args.verbose >= 3),
            );

            if let Some(file) = file {
                let file_layer = fmt::layer().with_ansi(false).with_writer(file);
                subscriber.with(file_layer).init();
            } else {
                subscriber.init();
            }
        }
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr));

            if let Some(file) = file {
                let file_layer = fmt::layer().json().with_writer(file);
                subscriber.with(file_layer).init();
            } else {
                subscriber.init();
            }
        }
        LogFormat::Compact => {
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr));

            if let Some(file) = file {
                let file_layer = fmt::layer().compact().with_ansi(false).with_writer(file);
                subscriber.with(file_layer).init();
            } else {
                subscriber.init();
            }
        }
    }

    Ok(())
}

fn level(args: &Args, config: &LoggingConfig) -> Result<Level> {
    if args.quiet {
        return Ok(Level::ERROR);
    }
    Ok(match args.verbose {
        0 => config
            .level
            .parse()
            .with_context(|| format!("Invalid log level in config: {}", config.level))?,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    })
}
