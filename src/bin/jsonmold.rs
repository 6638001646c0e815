//! jsonmold: apply a rule document to JSON input
//!
//! Usage:
//!   # Read from file, output to stdout
//!   jsonmold --rule video.rule.json response.json
//!
//!   # Read from stdin
//!   echo '{"id": "abc", "stats": {"views": 3}}' | jsonmold --rule video.rule.json
//!
//!   # Process NDJSON, one output line per input line
//!   jsonmold --rule video.rule.json --ndjson responses.jsonl
//!
//!   # Show the rule after alias expansion
//!   jsonmold --rule video.rule.json --expand-rule

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use jsonmold::stages::aliases;
use jsonmold::{Parser, ParserConfig, Rule, StageOrder};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(name = "jsonmold")]
#[command(about = "Validate, extract and reshape JSON with a declarative rule", long_about = None)]
struct Args {
    /// Rule document (JSON)
    #[arg(long, short = 'r', value_name = "RULE")]
    rule: PathBuf,

    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Process newline-delimited JSON (one JSON value per line)
    #[arg(long)]
    ndjson: bool,

    /// Print compact JSON instead of pretty-printed output
    #[arg(long)]
    compact: bool,

    /// Parser configuration file (JSON); flags below override it
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Separator for flattened keys (default: "-")
    #[arg(long)]
    separator: Option<String>,

    /// Flatten before remapping keys
    #[arg(long)]
    flatten_first: bool,

    /// Skip the rule check before extraction
    #[arg(long)]
    no_check: bool,

    /// Print the rule after alias expansion and exit
    #[arg(long)]
    expand_rule: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let rule = load_rule(&args.rule)?;
    let mut stdout = BufWriter::new(std::io::stdout().lock());

    if args.expand_rule {
        let expanded = aliases::expand(rule).context("Failed to expand rule aliases")?;
        let document = expanded.to_value().context("Failed to serialize expanded rule")?;
        write_value(&mut stdout, &document, args.compact)?;
        stdout.flush()?;
        return Ok(());
    }

    let parser = Parser::new(build_config(&args)?);
    tracing::debug!(config = ?parser.config(), "parser ready");

    let content = read_input(args.input.as_deref())?;

    if args.ndjson {
        let text = String::from_utf8_lossy(&content);
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line)
                .with_context(|| format!("Failed to parse JSON on line {}", number + 1))?;
            let output = parser
                .parse_to_any(&value, &rule)
                .with_context(|| format!("Rule failed on line {}", number + 1))?;
            write_value(&mut stdout, &output, true)?;
        }
    } else {
        for (index, value) in decode_documents(content)?.into_iter().enumerate() {
            let output = parser
                .parse_to_any(&value, &rule)
                .with_context(|| format!("Rule failed on document {}", index + 1))?;
            write_value(&mut stdout, &output, args.compact)?;
        }
    }

    stdout.flush()?;
    Ok(())
}

fn load_rule(path: &Path) -> Result<Rule> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rule {}", path.display()))?;
    let rule = Rule::from_json_str(&source)
        .with_context(|| format!("Invalid rule document {}", path.display()))?;
    Ok(rule)
}

/// Config file first, then command line overrides
fn build_config(args: &Args) -> Result<ParserConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Failed to open config {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => ParserConfig::default(),
    };

    if let Some(separator) = &args.separator {
        config.separator = separator.clone();
    }
    if args.flatten_first {
        config.stage_order = StageOrder::FlattenThenRemap;
    }
    if args.no_check {
        config.validate_rules = false;
    }
    Ok(config)
}

fn read_input(input: Option<&Path>) -> Result<Vec<u8>> {
    let reader = if let Some(path) = input {
        Box::new(File::open(path).with_context(|| format!("Failed to open {}", path.display()))?) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };

    let mut content = Vec::new();
    BufReader::new(reader)
        .read_to_end(&mut content)
        .context("Failed to read input")?;
    Ok(content)
}

/// Decode a single document with simd-json, falling back to a stream of
/// concatenated documents through serde_json
fn decode_documents(mut content: Vec<u8>) -> Result<Vec<Value>> {
    // simd-json parses in place, so keep the original bytes for the fallback
    let pristine = content.clone();
    match simd_json::serde::from_slice::<Value>(&mut content) {
        Ok(value) => Ok(vec![value]),
        Err(err) => {
            tracing::debug!(error = %err, "simd-json rejected input, trying a document stream");
            serde_json::Deserializer::from_slice(&pristine)
                .into_iter::<Value>()
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to parse JSON input")
        }
    }
}

fn write_value<W: Write>(writer: &mut W, value: &Value, compact: bool) -> Result<()> {
    if compact {
        serde_json::to_writer(&mut *writer, value)?;
    } else {
        serde_json::to_writer_pretty(&mut *writer, value)?;
    }
    writeln!(writer)?;
    Ok(())
}
