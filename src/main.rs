//! taskw command-line driver
//!
//! Loads a taskrc and exposes the parser, attribute codecs and filter
//! compiler for inspection from the shell.

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;
use taskw::cli::decode::{DecodeArgs, InputFormat};
use taskw::cli::{Cli, Command, ConfigArgs, FilterArgs};
use taskw::config::{ConfigTree, ConfigValue, TaskRc, default_taskrc_path};
use taskw::filter::Filter;
use taskw::logging;
use taskw::task::{TaskCodec, TaskRecord};
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log, cli.verbose)?;

    let taskrc = load_taskrc(&cli)?;
    info!("{}", taskrc);
    for diagnostic in taskrc.diagnostics() {
        debug!(code = ?diagnostic.code(), "Skipped: {}", diagnostic);
    }

    match cli.command {
        Command::Config(args) => run_config(&taskrc, args),
        Command::Udas => run_udas(&taskrc),
        Command::Filter(args) => run_filter(args),
        Command::Decode(args) => run_decode(&taskrc, args),
    }
}

/// Load the taskrc named on the command line, falling back to the default
/// location. A missing default file yields an empty configuration.
fn load_taskrc(cli: &Cli) -> Result<TaskRc> {
    let overrides = ConfigTree::from_pairs(cli.overrides.iter().cloned());

    if let Some(path) = &cli.taskrc {
        return TaskRc::load(path, overrides)
            .with_context(|| format!("Failed to load taskrc {}", path.display()));
    }
    match default_taskrc_path() {
        Some(path) if path.exists() => TaskRc::load(&path, overrides)
            .with_context(|| format!("Failed to load taskrc {}", path.display())),
        _ => {
            debug!("No taskrc found, using overrides only");
            Ok(TaskRc::from_tree(overrides))
        }
    }
}

fn run_config(taskrc: &TaskRc, args: ConfigArgs) -> Result<()> {
    let tree = taskrc.tree();
    let (prefix, value) = match &args.key {
        Some(key) => match tree.lookup(key) {
            Some(value) => (format!("{}.", key), value.clone()),
            None => anyhow::bail!("No setting named '{}'", key),
        },
        None => (String::new(), ConfigValue::Tree(tree.clone())),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    match value {
        ConfigValue::Scalar(text) => println!("{}", text),
        ConfigValue::Tree(subtree) => {
            for (key, text) in subtree.flatten() {
                println!("{}{}={}", prefix, key, text);
            }
        }
    }
    Ok(())
}

fn run_udas(taskrc: &TaskRc) -> Result<()> {
    let registry = taskrc.udas();
    if registry.is_empty() {
        println!("No user-defined attributes.");
        return Ok(());
    }
    for (name, codec) in registry.iter() {
        match codec.label() {
            Some(label) => println!("{}: {} ({})", name, codec.kind(), label),
            None => println!("{}: {}", name, codec.kind()),
        }
    }
    Ok(())
}

fn run_filter(args: FilterArgs) -> Result<()> {
    let filter = Filter::from_json_str(&args.filter).context("Invalid filter")?;
    for token in filter.compile()? {
        println!("{}", token);
    }
    Ok(())
}

fn run_decode(taskrc: &TaskRc, args: DecodeArgs) -> Result<()> {
    let codec = TaskCodec::from_taskrc(taskrc);
    let text = read_input(&args.file)?;

    let records: Vec<TaskRecord> = match args.input {
        InputFormat::Json => codec.decode_export(&text)?,
        InputFormat::Lines => text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| codec.decode_line(line))
            .collect::<taskw::Result<_>>()?,
    };
    debug!(count = records.len(), "Decoded tasks");

    let buckets = args.mode.partition(records);

    if args.args {
        for (bucket, records) in &buckets {
            println!("# {} ({})", bucket, records.len());
            for record in records {
                println!("{}", codec.encode_args(record)?.join(" "));
            }
        }
        return Ok(());
    }

    let mut out = Map::new();
    for (bucket, records) in &buckets {
        let encoded = records
            .iter()
            .map(|record| codec.encode(record).map(Value::Object))
            .collect::<taskw::Result<Vec<_>>>()?;
        out.insert(bucket.clone(), Value::Array(encoded));
    }
    println!("{}", serde_json::to_string_pretty(&Value::Object(out))?);
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
