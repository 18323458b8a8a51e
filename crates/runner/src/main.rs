//! Replay recorded book snapshots through the feature pipeline.
//!
//! Input is newline-delimited JSON, one raw venue snapshot per line, each
//! carrying a `symbol` field. One JSON feature report is written per line.
//!
//! Usage:
//!   lob-replay --config pipeline.json --input snapshots.ndjson

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use lob_core::PipelineConfig;
use lob_features::FeaturePipeline;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "lob-replay")]
#[command(about = "Replay order book snapshots and print features")]
struct Args {
    /// Pipeline configuration (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// NDJSON snapshot file. Reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Symbol field name in each snapshot
    #[arg(long, default_value = "symbol")]
    symbol_field: String,

    /// Abort on the first malformed snapshot instead of skipping it
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::level_filters::LevelFilter::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let receipt_field = config.book.receipt_timestamp_field.clone();
    let mut pipeline = FeaturePipeline::new(config).context("invalid pipeline config")?;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let mut out = BufWriter::new(io::stdout().lock());

    let mut processed = 0u64;
    let mut rejected = 0u64;
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("reading line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }

        let mut raw: Value = serde_json::from_str(&line)
            .with_context(|| format!("line {line_no} is not valid JSON"))?;
        let symbol = raw
            .get(&args.symbol_field)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .with_context(|| format!("line {line_no} has no '{}' field", args.symbol_field))?;

        if raw.get(&receipt_field).map_or(true, Value::is_null) {
            if let Value::Object(map) = &mut raw {
                map.insert(receipt_field.clone(), receipt_now());
            }
        }

        pipeline.subscribe(&symbol)?;
        match pipeline.on_snapshot(&symbol, &raw) {
            Ok(report) => {
                serde_json::to_writer(&mut out, &report)?;
                out.write_all(b"\n")?;
                processed += 1;
            }
            Err(e) if !args.strict => {
                warn!(line = line_no, symbol = %symbol, error = %e, "Skipping snapshot");
                rejected += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("line {line_no} ({symbol})"));
            }
        }
    }
    out.flush()?;

    info!(
        processed,
        rejected,
        symbols = pipeline.symbols().count(),
        "Replay complete"
    );
    Ok(())
}

/// Current wall-clock time in fractional seconds.
fn receipt_now() -> Value {
    let now = Utc::now();
    let secs = now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1e6;
    Value::from(secs)
}
