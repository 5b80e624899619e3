//! sheetwise CLI entry point.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use sheetwise_engine::Analyzer;
use sheetwise_foundation::{DetectionThresholds, Error, ErrorKind};
use sheetwise_output::{OutputGenerator, snapshot};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default output directory.
const DEFAULT_OUT_DIR: &str = "sheetwise-out";

/// Infer a relational schema, relationships and automation rules from a spreadsheet.
#[derive(Debug, Parser)]
#[command(name = "sheetwise", version, about)]
struct Cli {
    /// Spreadsheet to analyze (.xlsx, .xls, .csv)
    file: PathBuf,

    /// Directory for the four JSON documents [default: sheetwise-out]
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// JSON file with threshold overrides; missing fields keep their defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also save a MessagePack snapshot of the analysis
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Print the documents to stdout; files are written only with --out
    #[arg(long)]
    print: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

/// Installs a stderr subscriber. `RUST_LOG` wins when no flag is given.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = if quiet || verbose > 0 {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let thresholds = match &cli.config {
        Some(path) => load_thresholds(path)?,
        None => DetectionThresholds::default(),
    };

    let analyzer = Analyzer::new().with_thresholds(thresholds.clone());
    let result = analyzer.analyze_path(&cli.file)?;
    let bundle = OutputGenerator::new(&thresholds).generate(&result);

    if cli.print {
        for (name, json) in bundle.to_json()? {
            println!("// {name}");
            println!("{json}");
        }
    }
    if !cli.print || cli.out.is_some() {
        let dir = cli
            .out
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
        let written = bundle.write_to_dir(&dir)?;
        info!(dir = %dir.display(), files = written.len(), "documents written");
    }
    if let Some(path) = &cli.snapshot {
        snapshot::save_to_file(&result, path)?;
        info!(path = %path.display(), "snapshot saved");
    }

    let summary = format!(
        "{}: {} entities, {} relationships, {} rules, confidence {:.2} ({} warnings)",
        result.source_file,
        result.entities.len(),
        result.relationships.len(),
        result.rules.len(),
        result.score.overall,
        result.score.warnings.len(),
    );
    if cli.print {
        eprintln!("{summary}");
    } else {
        println!("{summary}");
    }
    Ok(())
}

/// Reads threshold overrides and checks them.
fn load_thresholds(path: &Path) -> Result<DetectionThresholds, Error> {
    let text = fs::read_to_string(path).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to read config '{}': {e}",
            path.display()
        )))
    })?;
    let thresholds: DetectionThresholds = serde_json::from_str(&text)
        .map_err(|e| Error::invalid_config(format!("{}: {e}", path.display())))?;
    thresholds.validate()?;
    Ok(thresholds)
}
