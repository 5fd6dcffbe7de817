//! flatline: Export JSON as CSV
//!
//! Usage:
//!   # Read a JSON array from a file, write CSV to stdout
//!   flatline --path items.json
//!
//!   # Read NDJSON from stdin, write CSV to a file
//!   cat items.jsonl | flatline --ndjson --outpath items.csv
//!
//!   # Name columns after property values, keep only the first offer
//!   flatline --path items.json --fo '{"gtin": {"named": true, "name": "type"}}' --al '{"offers": 1}'

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use flatline::{Config, CsvExport, Exporter, FieldOption, StatsCollector};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// Whole JSON documents per flag; aliases keep clap from reading them as repeated values
type RenamingRules = Vec<(String, String)>;
type HeaderList = Vec<String>;

#[derive(Parser, Debug)]
#[command(name = "flatline")]
#[command(about = "Export JSON as CSV", long_about = None)]
struct Args {
    /// The path to the JSON file (stdin if omitted)
    #[arg(long, value_name = "PATH")]
    path: Option<PathBuf>,

    /// Where to save CSV output (stdout if omitted)
    #[arg(long, value_name = "OUTPUT PATH")]
    outpath: Option<PathBuf>,

    /// Process newline-delimited JSON (one record per line)
    #[arg(long)]
    ndjson: bool,

    /// Stringify invalid data instead of skipping it
    #[arg(short = 's', long = "stringify")]
    stringify: bool,

    /// Maximum number of columns that could be created from property values (named fields)
    #[arg(long = "ncl", value_name = "NAMED COLUMNS LIMIT")]
    named_columns_limit: Option<usize>,

    /// Separator for internal paths; replace it if property names include "->"
    #[arg(long = "cs", value_name = "CUT SEPARATOR")]
    cut_separator: Option<String>,

    /// Separator for values grouped in a single cell (default "\n")
    #[arg(long = "gs", value_name = "GROUPED SEPARATOR")]
    grouped_separator: Option<String>,

    /// Options to format fields, e.g. '{"gtin": {"named": true, "name": "type"}}'
    #[arg(long = "fieldoptions", visible_alias = "fo", value_name = "JSON", value_parser = parse_json::<IndexMap<String, FieldOption>>)]
    field_options: Option<IndexMap<String, FieldOption>>,

    /// Export only the first N elements of arrays, e.g. '{"offers": 1}'
    #[arg(long = "arraylimits", visible_alias = "al", value_name = "JSON", value_parser = parse_json::<IndexMap<String, usize>>)]
    array_limits: Option<IndexMap<String, usize>>,

    /// Regex rules to rename columns, e.g. '[["^offers\\[0\\]->", ""]]'
    #[arg(long = "headersrenaming", visible_alias = "hr", value_name = "JSON", value_parser = parse_json::<RenamingRules>)]
    headers_renaming: Option<RenamingRules>,

    /// Headers to put first, in this order, e.g. '["name", "offers[0]->price"]'
    #[arg(long = "headersorder", visible_alias = "ho", value_name = "JSON", value_parser = parse_json::<HeaderList>)]
    headers_order: Option<HeaderList>,

    /// Regexes for headers to skip, e.g. '["name.*", "_key"]'
    #[arg(long = "headersfilters", visible_alias = "hf", value_name = "JSON", value_parser = parse_json::<HeaderList>)]
    headers_filters: Option<HeaderList>,

    /// Capitalize the first letter of every header
    #[arg(long)]
    capitalize: bool,

    /// JSON config file with "collector" and "export" sections; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write the collected stats as JSON to this file
    #[arg(long, value_name = "FILE")]
    stats_out: Option<PathBuf>,
}

fn parse_json<T: DeserializeOwned>(raw: &str) -> std::result::Result<T, serde_json::Error> {
    serde_json::from_str(raw)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let items = read_items(args.path.as_deref(), args.ndjson)?;
    tracing::info!(records = items.len(), "Loaded input");

    let items = Value::Array(items);
    let mut collector = StatsCollector::new(config.collector.clone());
    collector.process_items(&items).context("Failed to collect stats")?;
    let stats = collector.stats();

    if let Some(stats_path) = &args.stats_out {
        let file = File::create(stats_path)
            .with_context(|| format!("Failed to create stats file: {}", stats_path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &stats).context("Failed to write stats")?;
    }

    let exporter = Exporter::new(stats, config.export).context("Failed to prepare export")?;
    let records = items.as_array().map(Vec::as_slice).unwrap_or_default();
    match &args.outpath {
        Some(outpath) => {
            let file = File::create(outpath)
                .with_context(|| format!("Failed to create output file: {}", outpath.display()))?;
            write_csv(&exporter, records, BufWriter::new(file))?;
        }
        None => write_csv(&exporter, records, std::io::stdout().lock())?,
    }

    tracing::info!(columns = exporter.headers().len(), "Export finished");
    Ok(())
}

fn write_csv<W: Write>(exporter: &Exporter, records: &[Value], writer: W) -> Result<()> {
    let mut export = CsvExport::new(exporter, writer);
    export.write_all(records).context("Failed to write CSV")?;
    export.flush().context("Failed to flush CSV")?;
    Ok(())
}

/// Config file (or defaults) with command-line flags applied on top
fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&raw).context("Failed to parse config file")?
        }
        None => {
            // Without a config file invalid data is skipped unless asked otherwise
            let mut config = Config::default();
            config.export.stringify_invalid = false;
            config
        }
    };

    if args.stringify {
        config.export.stringify_invalid = true;
    }
    if let Some(limit) = args.named_columns_limit {
        config.collector.named_columns_limit = limit;
    }
    if let Some(separator) = &args.cut_separator {
        config.collector.cut_separator = separator.clone();
    }
    if let Some(separator) = &args.grouped_separator {
        config.export.grouped_separator = separator.replace("\\n", "\n");
    }
    if let Some(field_options) = &args.field_options {
        config.export.field_options = field_options.clone();
    }
    if let Some(array_limits) = &args.array_limits {
        config.export.array_limits = array_limits.clone();
    }
    if let Some(renaming) = &args.headers_renaming {
        config.export.headers_renaming = renaming.clone();
    }
    if let Some(order) = &args.headers_order {
        config.export.headers_order = order.clone();
    }
    if let Some(filters) = &args.headers_filters {
        config.export.headers_filters = filters.clone();
    }
    if args.capitalize {
        config.export.capitalize_headers = true;
    }

    // Both phases must split paths the same way
    config.export.cut_separator = config.collector.cut_separator.clone();
    Ok(config)
}

/// Read records from a file or stdin
fn read_items(path: Option<&Path>, ndjson: bool) -> Result<Vec<Value>> {
    let mut content = Vec::new();
    match path {
        Some(path) => {
            File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?
                .read_to_end(&mut content)
                .context("Failed to read input file")?;
        }
        None => {
            std::io::stdin()
                .read_to_end(&mut content)
                .context("Failed to read stdin")?;
        }
    }

    if ndjson {
        return parse_ndjson(&content);
    }

    // SIMD parsing mutates its buffer, keep the original for the fallback
    let mut scratch = content.clone();
    let value: Value = match simd_json::serde::from_slice(&mut scratch) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(error = %err, "SIMD parsing failed, falling back to serde_json");
            serde_json::from_slice(&content).context("Failed to parse JSON input")?
        }
    };

    Ok(match value {
        Value::Array(items) => items,
        other => vec![other],
    })
}

fn parse_ndjson(content: &[u8]) -> Result<Vec<Value>> {
    let text = std::str::from_utf8(content).context("Input is not valid UTF-8")?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Failed to parse JSON on line {}", i + 1))
        })
        .collect()
}
