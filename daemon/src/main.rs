//! Accord command-line entry point.
//!
//! Opens the LMDB store, wires the governance services with the JSON Lines
//! evidence log and the broadcast notifier, runs one subcommand and prints
//! its result as JSON on stdout. Logs go to stderr.

mod commands;
mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use accord_governance::{BroadcastNotifier, GovernanceEngine, JsonlEvidenceWriter};
use accord_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment, Migrator};
use accord_types::SystemClock;
use accord_utils::LogFormat;
use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;

use crate::commands::Command;
use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "accord", about = "Dual-consensus proposal governance")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// flags and env vars override them.
    #[arg(long, env = "ACCORD_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the LMDB store.
    #[arg(long, env = "ACCORD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Evidence log path (defaults to <data-dir>/evidence.jsonl).
    #[arg(long, env = "ACCORD_EVIDENCE_PATH")]
    evidence_path: Option<PathBuf>,

    /// LMDB map size in MiB.
    #[arg(long, env = "ACCORD_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// Log format: "human" or "json".
    #[arg(long, env = "ACCORD_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ACCORD_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// File config (or defaults) with command-line overrides applied.
    fn resolve_config(&self) -> anyhow::Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_toml_file(path)?,
            None => DaemonConfig::default(),
        };
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(path) = &self.evidence_path {
            config.evidence_path = Some(path.clone());
        }
        if let Some(mb) = self.map_size_mb {
            config.map_size_mb = mb;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}

fn open_store(config: &DaemonConfig) -> anyhow::Result<LmdbEnvironment> {
    let data_dir: &Path = &config.data_dir;
    check_data_dir(data_dir).map_err(anyhow::Error::msg)?;
    let env = LmdbEnvironment::open(data_dir, config.max_dbs, config.map_size_bytes())
        .with_context(|| format!("opening LMDB at {}", data_dir.display()))?;
    Migrator::run(&env).context("running schema migrations")?;

    let report = check_integrity(&env).context("integrity check")?;
    if !report.is_healthy() {
        for error in &report.errors {
            tracing::error!(%error, "integrity problem");
        }
        anyhow::bail!(
            "integrity check failed with {} problem(s); refusing to write",
            report.errors.len()
        );
    }
    tracing::debug!(
        databases = report.databases_checked,
        entries = report.total_entries,
        "integrity check passed"
    );
    Ok(env)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    accord_utils::init_logging(config.log_format, &config.log_level);

    let store = Arc::new(open_store(&config)?);
    let evidence_path = config.evidence_path();
    let evidence = Arc::new(
        JsonlEvidenceWriter::open(&evidence_path)
            .with_context(|| format!("opening evidence log {}", evidence_path.display()))?,
    );

    let notifier = Arc::new(BroadcastNotifier::default());
    let mut events = notifier.subscribe();
    let listener = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(?event, "governance event"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event listener lagged")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let engine = GovernanceEngine::new(
        store,
        evidence,
        Arc::clone(&notifier),
        Arc::new(SystemClock),
    );
    let command = cli.command;
    let result = tokio::task::spawn_blocking(move || commands::run(&engine, command)).await?;

    // Every sender is gone once the engine is dropped; the listener drains
    // what was published and exits.
    drop(notifier);
    listener.await?;

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&commands::error_json(&e))?);
            tracing::warn!(error = %e, "command failed");
            std::process::exit(match e.kind() {
                accord_governance::ErrorKind::Validation => 2,
                accord_governance::ErrorKind::NotFound => 3,
                accord_governance::ErrorKind::ConflictOrInfra => 1,
            });
        }
    }
}
