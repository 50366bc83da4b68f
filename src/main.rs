//! intent-prefetch - pointer trace replay
//!
//! Entry point for the replay binary.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intent_prefetch::config::Config;
use intent_prefetch::replay::{self, PointerTrace};
use intent_prefetch::utils::format_user_error;

/// Command-line arguments for intent-prefetch
#[derive(Parser, Debug)]
#[command(name = "intent-prefetch")]
#[command(version, about = "Replay pointer traces through speculative prefetch controllers", long_about = None)]
pub struct Args {
    /// Pointer trace to replay (JSON)
    #[arg(required_unless_present = "print_config")]
    pub trace: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, env = "INTENT_PREFETCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Replay speed multiplier
    #[arg(long, default_value = "1.0")]
    pub speed: f64,

    /// Override speculation sensitivity (0.0-1.0)
    #[arg(short, long)]
    pub sensitivity: Option<f64>,

    /// Log every score and transition
    #[arg(long)]
    pub debug: bool,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Write logs to file (in addition to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before logging so its [logging] section applies
    let (config, load_error) = load_config(&args);
    let config = config?;

    let _log_guard = init_logging(&args, &config)?;
    if let Some(e) = load_error {
        warn!("Failed to load config: {:#}, using defaults", e);
    }

    if args.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    info!("════════════════════════════════════════════════════════");
    info!("  intent-prefetch v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {}", env!("BUILD_DATE"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!(
        "  Profile: {}",
        if cfg!(debug_assertions) { "debug" } else { "release" }
    );
    info!("════════════════════════════════════════════════════════");

    if let Err(e) = run(&args, &config).await {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }

    Ok(())
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    let path = args.trace.as_ref().context("No trace file given")?;
    let trace = PointerTrace::load(path)?;
    info!(
        "Loaded trace {} ({} samples, {} commits)",
        path.display(),
        trace.samples.len(),
        trace.commits.len()
    );

    let report = replay::run(config, &trace, args.speed).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_text());
    }

    Ok(())
}

/// Load the config named on the command line, or the default location.
///
/// An explicit path must load. A missing or broken default file falls back
/// to defaults; the error is returned separately so it can be logged once
/// logging is up.
fn load_config(args: &Args) -> (Result<Config>, Option<anyhow::Error>) {
    let loaded = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => (Ok(config), None),
            Err(e) => {
                eprintln!("{}", format_user_error(&e));
                return (Err(e), None);
            }
        },
        None => {
            let path = Config::default_path();
            if path.exists() {
                match Config::load(&path) {
                    Ok(config) => (Ok(config), None),
                    Err(e) => (Ok(Config::default_config()), Some(e)),
                }
            } else {
                (Ok(Config::default_config()), None)
            }
        }
    };

    match loaded {
        (Ok(config), load_error) => {
            let config = config.with_overrides(args.sensitivity, args.debug);
            if let Err(e) = config.validate() {
                eprintln!("{}", format_user_error(&e));
                return (Err(e), load_error);
            }
            (Ok(config), load_error)
        }
        other => other,
    }
}

fn init_logging(args: &Args, config: &Config) -> Result<Option<WorkerGuard>> {
    let log_level = match args.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "intent_prefetch={level},warn",
            level = log_level
        ))
    });

    let format = args
        .log_format
        .as_deref()
        .unwrap_or(config.logging.format.as_str());

    let (file_writer, guard) = match args.log_file.as_ref().or(config.logging.file.as_ref()) {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    // Logs go to stderr so the report on stdout stays clean
    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .with(file_writer.map(|w| {
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(w)
                        .with_ansi(false)
                }))
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .with(file_writer.map(|w| {
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(w)
                        .with_ansi(false)
                }))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .with(file_writer.map(|w| {
                    tracing_subscriber::fmt::layer()
                        .with_writer(w)
                        .with_ansi(false)
                }))
                .init();
        }
    }

    if let Some(path) = args.log_file.as_ref().or(config.logging.file.as_ref()) {
        info!("Logging to file: {}", path.display());
    }

    Ok(guard)
}
