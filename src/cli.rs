use crate::demo;
use crate::error::AppError;
use crate::render::{render_report, render_rules, AnalysisReport};
use crate::telemetry;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use nexus_engine::{
    AnalysisInput, AnalysisOutcome, AppConfig, Jurisdiction, NexusAnalyzer, ReferenceData,
    ReferenceTables,
};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "nexus-analyzer",
    about = "Determine sales tax nexus and estimate liability across US jurisdictions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run nexus determination and liability estimation (default command)
    Analyze(AnalyzeArgs),
    /// List the economic nexus rules and tax rates in the reference tables
    Rules(RulesArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct AnalyzeArgs {
    /// Analysis input document (JSON). Runs the built-in sample when omitted.
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
    /// Reference tables (JSON) replacing the bundled rules, rates and policies
    #[arg(long)]
    pub(crate) reference: Option<PathBuf>,
    /// Evaluation date for deadlines, penalties and interest (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Abort the run when it takes longer than this many seconds
    #[arg(long)]
    pub(crate) timeout_secs: Option<u64>,
    /// Emit the full outcome as JSON instead of the text report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RulesArgs {
    /// Restrict the listing to one jurisdiction code (e.g. TX)
    #[arg(long, value_parser = parse_jurisdiction)]
    pub(crate) jurisdiction: Option<Jurisdiction>,
    /// Reference tables (JSON) to list instead of the bundled ones
    #[arg(long)]
    pub(crate) reference: Option<PathBuf>,
    /// Emit the tables as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Analyze(AnalyzeArgs::default()));

    match command {
        Command::Analyze(args) => run_analyze(args).await,
        Command::Rules(args) => run_rules(args),
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn parse_jurisdiction(raw: &str) -> Result<Jurisdiction, String> {
    raw.parse::<Jurisdiction>().map_err(|err| err.to_string())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|source| AppError::Input {
        path: path.to_path_buf(),
        source,
    })
}

fn load_reference(path: Option<&Path>) -> Result<ReferenceData, AppError> {
    let reference = match path {
        Some(path) => ReferenceData::from_tables(load_json::<ReferenceTables>(path)?)?,
        None => ReferenceData::standard()?,
    };
    Ok(reference)
}

async fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let AnalyzeArgs {
        input,
        reference,
        today,
        timeout_secs,
        json,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, config.environment)?;

    let input = match input {
        Some(path) => load_json::<AnalysisInput>(&path)?,
        None => {
            info!("no input supplied; analyzing the built-in sample");
            demo::sample_input()
        }
    };
    let reference = load_reference(reference.as_deref())?;

    let mut engine = config.engine;
    if let Some(today) = today {
        engine = engine.as_of(today);
    }
    info!(environment = ?config.environment, as_of = %engine.as_of, "configuration loaded");

    let analyzer = NexusAnalyzer::new(engine, reference);
    let outcome = execute(analyzer, input, timeout_secs.map(Duration::from_secs)).await?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &AnalysisReport::new(&outcome))?;
        writeln!(out)?;
    } else {
        render_report(&outcome, &mut out)?;
    }
    Ok(())
}

/// Runs the analysis on the blocking pool. When `timeout` elapses the run is
/// cancelled cooperatively and the caller gets [`AppError::Timeout`].
pub async fn execute(
    analyzer: NexusAnalyzer,
    input: AnalysisInput,
    timeout: Option<Duration>,
) -> Result<AnalysisOutcome, AppError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);
    let handle = tokio::task::spawn_blocking(move || {
        analyzer.analyze_with_cancel(&input, &worker_cancel)
    });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                tracing::warn!(seconds = limit.as_secs(), "analysis timed out; cancelling");
                return Err(AppError::Timeout(limit));
            }
        },
        None => handle.await,
    };

    Ok(joined??)
}

fn run_rules(args: RulesArgs) -> Result<(), AppError> {
    let reference = load_reference(args.reference.as_deref())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        let mut tables = match args.reference.as_deref() {
            Some(path) => load_json::<ReferenceTables>(path)?,
            None => ReferenceData::standard_tables(),
        };
        if let Some(only) = args.jurisdiction {
            tables.rules.retain(|rule| rule.jurisdiction == only);
            tables.tax_configs.retain(|config| config.jurisdiction == only);
            tables.policies.retain(|policy| policy.jurisdiction == only);
        }
        serde_json::to_writer_pretty(&mut out, &tables)?;
        writeln!(out)?;
    } else {
        render_rules(&reference, args.jurisdiction, &mut out)?;
    }
    Ok(())
}
