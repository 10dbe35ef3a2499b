//! CLI command definitions for taskw
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod decode;

use crate::logging::LogTarget;
use clap::{Args, Parser, Subcommand};
use decode::DecodeArgs;
use std::path::PathBuf;

/// Inspect taskrc files, attribute codecs and filter compilation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the taskrc file (defaults to $TASKRC or ~/.taskrc)
    #[arg(short = 'c', long, visible_alias = "config", global = true)]
    pub taskrc: Option<PathBuf>,

    /// Setting that takes precedence over the file, as key=value (repeatable)
    #[arg(short = 'o', long = "override", value_name = "KEY=VALUE", value_parser = parse_override, global = true)]
    pub overrides: Vec<(String, String)>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: LogTarget,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the merged configuration, or one setting
    Config(ConfigArgs),

    /// List user-defined attributes and their codecs
    Udas,

    /// Compile a JSON filter into query arguments
    Filter(FilterArgs),

    /// Decode exported tasks and print them bucketed by status
    Decode(DecodeArgs),
}

/// Arguments for the config subcommand
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Dotted setting name, e.g. `uda.priority.type`
    #[arg(value_name = "KEY")]
    pub key: Option<String>,

    /// Print the tree as JSON instead of flat key=value lines
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the filter subcommand
#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Filter object, e.g. '{"or": [["status", "pending"], ["status", "waiting"]]}'
    #[arg(value_name = "JSON")]
    pub filter: String,
}

/// Parse a `key=value` override.
fn parse_override(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Invalid override '{}'. Expected KEY=VALUE", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Invalid override '{}'. Key is empty", raw));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("data.location=/tmp/x").unwrap(),
            ("data.location".to_string(), "/tmp/x".to_string())
        );
        assert_eq!(parse_override("a=b=c").unwrap().1, "b=c");
        assert!(parse_override("novalue").is_err());
        assert!(parse_override("=x").is_err());
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::parse_from([
            "taskw",
            "filter",
            "{}",
            "--config",
            "/tmp/rc",
            "-o",
            "uda.a.type=numeric",
            "--log",
            "off",
        ]);
        assert_eq!(cli.taskrc, Some(PathBuf::from("/tmp/rc")));
        assert_eq!(cli.overrides.len(), 1);
        assert_eq!(cli.log, LogTarget::Off);
        assert!(matches!(cli.command, Command::Filter(ref f) if f.filter == "{}"));
    }
}
