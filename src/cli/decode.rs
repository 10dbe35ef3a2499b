//! Decode subcommand for taskw CLI
//!
//! Reads an engine JSON export (or data-file lines) and re-emits the records.

use crate::task::LoadCommand;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the decode subcommand
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Export file to read, or `-` for stdin
    #[arg(value_name = "FILE", default_value = "-")]
    pub file: PathBuf,

    /// Which buckets to print: all (default), pending, or completed
    #[arg(short, long, default_value = "all", value_name = "MODE")]
    pub mode: LoadCommand,

    /// Input format: json (default) or lines
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub input: InputFormat,

    /// Print `key:"value"` arguments instead of JSON
    #[arg(long)]
    pub args: bool,
}

/// Shape of the decode input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputFormat {
    /// A JSON array as produced by `task export`
    #[default]
    Json,
    /// One `[key:"value" ...]` line per task
    Lines,
}

impl std::str::FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(InputFormat::Json),
            "lines" | "data" => Ok(InputFormat::Lines),
            _ => Err(format!(
                "Invalid input format '{}'. Valid options: json, lines",
                s
            )),
        }
    }
}
