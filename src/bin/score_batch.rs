// Batch scoring binary
//
// Usage:
//   score_batch <requests.csv> [--config scorer.json] [--conservation cons.csv]
//               [--frequency gnomad=freq.csv]... [--format jsonl|markdown]
//
// One JSON document per variant on stdout (jsonl, default) or one Markdown
// rationale per variant. Logs go to stderr; RUST_LOG overrides the filter.

use anyhow::{bail, Context, Result};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use variant_mechanism_scorer::explanation::MarkdownFormatter;
use variant_mechanism_scorer::{load_variant_requests, ConservationTable, FrequencyTable, ScorerConfig, VariantScorer};

enum OutputFormat {
    JsonLines,
    Markdown,
}

struct Args {
    requests: PathBuf,
    config: Option<PathBuf>,
    conservation: Option<PathBuf>,
    frequency: Vec<(String, PathBuf)>,
    format: OutputFormat,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut requests = None;
    let mut config = None;
    let mut conservation = None;
    let mut frequency = Vec::new();
    let mut format = OutputFormat::JsonLines;

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().with_context(|| format!("{} needs a value", flag));
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(value("--config")?)),
            "--conservation" => conservation = Some(PathBuf::from(value("--conservation")?)),
            "--frequency" => {
                let entry = value("--frequency")?;
                let (name, path) = entry
                    .split_once('=')
                    .with_context(|| format!("--frequency expects name=path, got '{}'", entry))?;
                frequency.push((name.to_string(), PathBuf::from(path)));
            }
            "--format" => {
                format = match value("--format")?.as_str() {
                    "jsonl" | "json" => OutputFormat::JsonLines,
                    "markdown" | "md" => OutputFormat::Markdown,
                    other => bail!("unknown format '{}'", other),
                }
            }
            flag if flag.starts_with("--") => bail!("unknown flag '{}'", flag),
            path => requests = Some(PathBuf::from(path)),
        }
    }

    Ok(Args {
        requests: requests.context("usage: score_batch <requests.csv> [--config ..] [--conservation ..] [--frequency name=path] [--format jsonl|markdown]")?,
        config,
        conservation,
        frequency,
        format,
    })
}

fn build_scorer(args: &Args) -> Result<VariantScorer> {
    let config = match &args.config {
        Some(path) => ScorerConfig::load(path).with_context(|| format!("Failed to load config {:?}", path))?,
        None => ScorerConfig::default(),
    };
    let mut scorer = VariantScorer::new(config)?;

    if let Some(path) = &args.conservation {
        let table = ConservationTable::load_csv(path)?;
        scorer = scorer.with_conservation_source(Arc::new(table));
    }
    for (name, path) in &args.frequency {
        let table = FrequencyTable::load_csv(Path::new(path), name)?;
        scorer = scorer.with_frequency_source(Arc::new(table));
    }
    Ok(scorer)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "variant_mechanism_scorer=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = parse_args()?;
    let scorer = build_scorer(&args)?;
    let requests = load_variant_requests(&args.requests)?;
    tracing::info!(requests = requests.len(), "scoring batch");

    let results = scorer.score_batch(&requests);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for result in &results {
        match args.format {
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut out, result).context("Failed to serialize result")?;
                writeln!(out)?;
            }
            OutputFormat::Markdown => {
                writeln!(out, "{}", MarkdownFormatter::format(&result.rationale))?;
            }
        }
    }
    out.flush()?;

    let malformed = results.iter().filter(|r| r.is_malformed()).count();
    tracing::info!(scored = results.len() - malformed, malformed, "done");
    Ok(())
}
