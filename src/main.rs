//! DirSentry: polling directory monitor with a CSV audit trail.
//!
//! Thin binary entry point. All logic lives in the `dirsentry-core` crate.

use anyhow::Context;
use clap::{Parser, Subcommand};
use dirsentry_core::analysis::summarize;
use dirsentry_core::audit::read_log;
use dirsentry_core::config::{MissingDirectoryPolicy, MonitorConfig, DEFAULT_LOG_FILE};
use dirsentry_core::model::EventKind;
use dirsentry_core::monitor::{start_monitor, DirectoryMonitor, MonitorMessage};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing_subscriber::EnvFilter;

/// Number of entries listed under "Most active" by `summary`.
const SUMMARY_TOP_ENTRIES: usize = 10;

#[derive(Parser)]
#[command(name = "dirsentry", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch a directory and append every change to the audit log.
    Watch {
        /// Directory to monitor (created if missing). Defaults to ./monitor_test.
        dir: Option<PathBuf>,
        /// Audit log path. Defaults to directory_log.csv.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Polling interval in milliseconds. Defaults to 1000.
        #[arg(long)]
        interval_ms: Option<u64>,
        /// JSON config file; command-line flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Report every known entry as deleted if the directory disappears.
        #[arg(long)]
        flush_deleted: bool,
        /// Entry count at which metadata extraction goes parallel (0 = never).
        #[arg(long)]
        parallel_threshold: Option<usize>,
    },
    /// Print event counts from an existing audit log.
    Summary {
        #[arg(long, default_value = DEFAULT_LOG_FILE)]
        log: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    // Events go to stdout; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Watch {
            dir,
            log,
            interval_ms,
            config,
            flush_deleted,
            parallel_threshold,
        } => {
            let mut cfg = match config {
                Some(path) => MonitorConfig::from_json_file(&path)?,
                None => MonitorConfig::default(),
            };
            if let Some(dir) = dir {
                cfg.directory = dir;
            }
            if let Some(log) = log {
                cfg.log_file = log;
            }
            if let Some(ms) = interval_ms {
                cfg.interval_ms = ms;
            }
            if flush_deleted {
                cfg.on_missing_directory = MissingDirectoryPolicy::FlushDeleted;
            }
            if let Some(threshold) = parallel_threshold {
                cfg.parallel_threshold = threshold;
            }
            watch(cfg)
        }
        Command::Summary { log } => summary(&log),
    }
}

fn watch(config: MonitorConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.directory)
        .with_context(|| format!("failed to create {}", config.directory.display()))?;

    let monitor = DirectoryMonitor::new(config)?;
    let handle = start_monitor(monitor).context("failed to start monitor thread")?;

    let cancel = handle.cancel_flag();
    ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed))
        .context("failed to install Ctrl-C handler")?;

    tracing::info!("DirSentry running, press Ctrl-C to stop");

    loop {
        match handle.receiver.recv() {
            Ok(MonitorMessage::Event(event)) => println!("{event}"),
            Ok(MonitorMessage::ScanFailed { message, .. }) => {
                tracing::warn!("scan failed: {message}");
            }
            Ok(MonitorMessage::LogWriteFailed { message }) => {
                tracing::error!("event not recorded: {message}");
            }
            Ok(MonitorMessage::Stopped) | Err(crossbeam_channel::RecvError) => break,
        }
    }

    let stats = handle.stats();
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("monitor thread panicked"))?;
    tracing::info!(
        "DirSentry stopped after {} steps ({} events logged, {} write failures, {} scan failures)",
        stats.steps,
        stats.events_logged,
        stats.write_failures,
        stats.scan_failures
    );
    Ok(())
}

fn summary(log: &Path) -> anyhow::Result<()> {
    let records = read_log(log)?;
    let s = summarize(&records, SUMMARY_TOP_ENTRIES);

    println!("{}: {} events", log.display(), s.total);
    if let (Some(first), Some(last)) = (s.first_at, s.last_at) {
        println!("  from {first} to {last}");
    }
    for kind in [EventKind::Created, EventKind::Deleted, EventKind::Modified] {
        println!("  {:<10} {}", kind.label(), s.count(kind));
    }

    if !s.by_file_type.is_empty() {
        println!("By file type:");
        for t in &s.by_file_type {
            println!("  {:<14} {}", t.file_type, t.events);
        }
    }
    if !s.most_active.is_empty() {
        println!("Most active:");
        for e in &s.most_active {
            println!("  {:<6} {}", e.events, e.name);
        }
    }
    Ok(())
}
