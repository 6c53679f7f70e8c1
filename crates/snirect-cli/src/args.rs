//! Command-line argument parsing

use crate::commands::Command;
use clap::{Parser, ValueEnum};
use snirect_core::Format;
use std::path::PathBuf;

/// snirect-rules - SNI spoofing rule toolkit
///
/// Resolves hostnames against layered rule files, converts rules between
/// the TOML and JSON layouts and imports Cealing-Host lists.
#[derive(Parser, Debug)]
#[command(name = "snirect-rules")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true, env = "SNIRECT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format for logs
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Log file path
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<String>,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// Compact format
    Compact,
}

/// Rule file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Nested TOML tables
    Toml,
    /// Flat JSON rule lists
    Json,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Toml => Format::Toml,
            FormatArg::Json => Format::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose() {
        let args = Args::parse_from(["snirect-rules", "-v", "check", "rules.toml"]);
        assert_eq!(args.verbose, 1);

        let args = Args::parse_from(["snirect-rules", "check", "rules.toml", "-vvv"]);
        assert_eq!(args.verbose, 3);
    }

    #[test]
    fn test_resolve_args() {
        let args = Args::parse_from([
            "snirect-rules",
            "resolve",
            "www.google.com.hk",
            "other.com",
            "--override",
            "user.toml",
            "--no-builtin",
        ]);

        match args.command {
            Command::Resolve(resolve) => {
                assert_eq!(resolve.hosts, vec!["www.google.com.hk", "other.com"]);
                assert_eq!(resolve.overrides, vec![PathBuf::from("user.toml")]);
                assert!(resolve.no_builtin);
                assert!(resolve.base.is_empty());
            }
            other => panic!("Expected resolve, got {other:?}"),
        }
    }

    #[test]
    fn test_convert_format_flags() {
        let args = Args::parse_from([
            "snirect-rules",
            "convert",
            "in.txt",
            "out.txt",
            "--from",
            "json",
            "--to",
            "toml",
        ]);

        match args.command {
            Command::Convert(convert) => {
                assert_eq!(convert.from.map(Format::from), Some(Format::Json));
                assert_eq!(convert.to.map(Format::from), Some(Format::Toml));
            }
            other => panic!("Expected convert, got {other:?}"),
        }
    }
}
