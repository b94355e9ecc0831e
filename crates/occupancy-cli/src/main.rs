//! Occupancy CLI - live facility occupancy in the terminal.
//!
//! Shows the current occupancy of up to three facilities, falling back to the
//! last cached reading when the network is unreachable.

mod cli;
mod render;
mod styles;

use std::io::{self, IsTerminal};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use occupancy_core::{
    parse_facility_ids, watch, Config, CycleReport, FileBlobStore, HttpFetcher,
    RefreshError, RefreshOrchestrator, TableParser,
};

use cli::Cli;
use render::{render_failure, render_report, RenderOptions};

/// Directory for a daily-rolling log file, in addition to stderr
const LOG_DIR_ENV: &str = "OCCUPANCY_LOG_DIR";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file log on drop and must outlive `main`'s work.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "occupancy.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(std::env::var_os(LOG_DIR_ENV).map(PathBuf::from));

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(enabled) = cli.offline_mode {
        config.offline_mode_enabled = enabled;
    }
    if cli.no_color {
        config.color_coding_enabled = false;
    }
    if cli.no_timestamp {
        config.timestamp_enabled = false;
    }

    if cli.write_config {
        match &cli.config {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        println!("Configuration written");
        return Ok(ExitCode::SUCCESS);
    }

    let cache_dir = match &cli.cache_dir {
        Some(dir) => dir.clone(),
        None => config.cache_dir()?,
    };
    let blobs = FileBlobStore::new(cache_dir.clone())
        .with_context(|| format!("Failed to open cache directory: {}", cache_dir.display()))?;
    info!(cache_dir = %blobs.dir().display(), "Using cache directory");
    let parser = TableParser::new(&config.facility_label)
        .context("Invalid facility label")?;
    let fetcher = HttpFetcher::new(config.fetch_timeout())?;

    let facilities = parse_facility_ids(
        cli.facilities.as_deref(),
        config.facility_delimiter,
        config.default_facility,
    );
    let opts = RenderOptions {
        label: config.facility_label.clone(),
        color: config.color_coding_enabled && io::stdout().is_terminal(),
        timestamp: config.timestamp_enabled,
    };

    let orchestrator = RefreshOrchestrator::new(config, fetcher, blobs, parser);
    info!(facilities = ?facilities, "Occupancy starting");

    if cli.cleanup {
        let removed = orchestrator.cleanup_cache()?;
        println!("Removed {} expired cache entries", removed);
        return Ok(ExitCode::SUCCESS);
    }

    if cli.watch {
        let clear = !cli.json && io::stdout().is_terminal();
        let watching = watch(&orchestrator, &facilities, |outcome| {
            if clear {
                if let Err(e) = execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0)) {
                    warn!(error = %e, "Failed to clear terminal");
                }
            }
            if let Err(e) = print_outcome(outcome, &opts, cli.json) {
                warn!(error = %e, "Failed to print report");
            }
            ControlFlow::Continue(())
        });

        tokio::select! {
            _ = watching => {}
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted, shutting down");
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let outcome = orchestrator.run_cycle(&facilities).await;
    if print_outcome(&outcome, &opts, cli.json)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Print a cycle outcome; returns whether it produced any data.
fn print_outcome(
    outcome: &Result<CycleReport, RefreshError>,
    opts: &RenderOptions,
    json: bool,
) -> Result<bool> {
    match outcome {
        Ok(report) if json => {
            println!("{}", serde_json::to_string_pretty(report)?);
            Ok(true)
        }
        Ok(report) => {
            println!("{}", render_report(report, opts));
            Ok(true)
        }
        Err(e) if json => {
            let error = serde_json::json!({ "error": e.to_string() });
            println!("{}", serde_json::to_string_pretty(&error)?);
            Ok(false)
        }
        Err(e) => {
            eprintln!("{}", render_failure(e));
            Ok(false)
        }
    }
}
