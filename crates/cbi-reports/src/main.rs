//! cbi-reports: rebuilds the Chicago BI report tables.
//!
//! ```bash
//! # Long-running orchestrator (SIGHUP runs a cycle now, SIGINT/SIGTERM stop)
//! cbi-reports run
//!
//! # One cycle against a specific database
//! cbi-reports --database /data/chicago_bi.db run --once
//!
//! # Resolved builder order
//! cbi-reports plan
//!
//! # Source readiness and report row counts
//! cbi-reports status --json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use cbi_core::config::{CbiConfig, CliOverrides};
use cbi_core::constants::VERSION;
use cbi_core::events::types::{BuilderCompletedEvent, BuilderFailedEvent, CycleCompletedEvent};
use cbi_core::events::{EventDispatcher, ReportEventHandler};
use cbi_core::{REPORT_TABLES, SOURCE_TABLES};
use cbi_reports::builders::{default_builders, BuilderSettings};
use cbi_reports::crosswalk::{ensure_crosswalks_present, CrosswalkKind, ProjectRoot};
use cbi_reports::pipeline::{ExecutionPlan, Orchestrator, TriggerHandle};
use cbi_storage::queries::catalog;
use cbi_storage::{check_table_ready, DatabaseManager};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "cbi-reports", version = VERSION)]
#[command(about = "Derives the Chicago BI report tables from collector data")]
struct Cli {
    /// Config file, replacing chicago_bi.toml in the working directory
    #[arg(long, global = true, env = "CBI_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Directory holding the crosswalk CSVs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Resolve permit ZIP codes with the live geocoder
    #[arg(long, global = true)]
    use_geocoding: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the orchestrator
    Run {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
    /// Print the resolved builder order
    Plan {
        #[arg(long)]
        json: bool,
    },
    /// Show source table readiness and report row counts
    Status {
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        let run_once = match self.command {
            Command::Run { once: true } => Some(true),
            _ => None,
        };
        CliOverrides {
            config_file: self.config.clone(),
            database_path: self.database.clone(),
            data_dir: self.data_dir.clone(),
            run_once,
            use_geocoding: self.use_geocoding.then_some(true),
        }
    }
}

/// Logs pipeline progress.
struct LogEventHandler;

impl ReportEventHandler for LogEventHandler {
    fn on_builder_completed(&self, event: &BuilderCompletedEvent) {
        info!(
            builder = %event.builder,
            steps = event.steps,
            duration_ms = event.duration_ms,
            "builder completed"
        );
    }

    fn on_builder_failed(&self, event: &BuilderFailedEvent) {
        warn!(
            builder = %event.builder,
            code = %event.error_code,
            "builder failed, will retry next cycle"
        );
    }

    fn on_cycle_completed(&self, event: &CycleCompletedEvent) {
        info!(
            cycle = event.cycle,
            succeeded = event.succeeded,
            failed = event.failed,
            duration_ms = event.duration_ms,
            "cycle summary"
        );
    }
}

#[derive(Debug, Serialize)]
struct SourceStatus {
    table: &'static str,
    ready: bool,
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReportStatus {
    table: &'static str,
    rows: Option<i64>,
}

#[derive(Debug, Serialize)]
struct Status {
    sources: Vec<SourceStatus>,
    reports: Vec<ReportStatus>,
}

#[tokio::main]
async fn main() -> ExitCode {
    cbi_core::tracing::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "cbi-reports failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    let cwd = std::env::current_dir()?;
    let config = CbiConfig::load(&cwd, Some(&cli.overrides()))?;

    match cli.command {
        Command::Run { .. } => run_orchestrator(&cwd, config).await,
        Command::Plan { json } => print_plan(&cwd, &config, json),
        Command::Status { json } => print_status(&config, json),
    }
}

async fn run_orchestrator(cwd: &std::path::Path, config: CbiConfig) -> Result<(), BoxError> {
    let project = ProjectRoot::discover(cwd, &config.data.effective_data_dir())?;
    ensure_crosswalks_present(&project)?;

    let db = Arc::new(DatabaseManager::open(
        &config.database.effective_path(),
        config.database.effective_read_pool_size(),
    )?);
    let settings = BuilderSettings::from_config(&config, &project);
    let plan = ExecutionPlan::resolve(default_builders(&settings))?;
    info!(
        order = ?plan.names(),
        permit_zips = settings.permit_zips.name(),
        "execution plan resolved"
    );

    let mut events = EventDispatcher::new();
    events.register(Arc::new(LogEventHandler));
    let orchestrator = Orchestrator::from_config(db, plan, &config.schedule).with_events(events);

    let signals = tokio::spawn(forward_signals(orchestrator.trigger_handle()));
    let cycles = tokio::task::spawn_blocking(move || orchestrator.run()).await??;
    signals.abort();

    info!(cycles, "cbi-reports exiting");
    Ok(())
}

/// SIGHUP requests a cycle; SIGINT and SIGTERM shut down.
async fn forward_signals(handle: TriggerHandle) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let registered = (
            signal(SignalKind::hangup()),
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        );
        if let (Ok(mut hangup), Ok(mut terminate), Ok(mut interrupt)) = registered {
            loop {
                tokio::select! {
                    _ = hangup.recv() => {
                        if handle.trigger() {
                            info!("SIGHUP received, cycle requested");
                        } else {
                            info!("SIGHUP received, cycle already pending");
                        }
                    }
                    _ = terminate.recv() => break,
                    _ = interrupt.recv() => break,
                }
            }
            info!("shutdown signal received");
            handle.shutdown();
            return;
        }
        warn!("failed to register unix signal handlers; falling back to ctrl-c");
    }

    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
        handle.shutdown();
    }
}

fn print_plan(cwd: &std::path::Path, config: &CbiConfig, json: bool) -> Result<(), BoxError> {
    // Builders are only described here, so a missing data directory is fine.
    let settings = match ProjectRoot::discover(cwd, &config.data.effective_data_dir()) {
        Ok(project) => BuilderSettings::from_config(config, &project),
        Err(_) => BuilderSettings::new(
            config
                .data
                .effective_data_dir()
                .join(CrosswalkKind::CommunityAreaToZip.file_name()),
        ),
    };
    let plan = ExecutionPlan::resolve(default_builders(&settings))?;
    let described = plan.describe();

    if json {
        println!("{}", serde_json::to_string_pretty(&described)?);
        return Ok(());
    }
    for (i, builder) in described.iter().enumerate() {
        println!("{}. {}", i + 1, builder.name);
        println!("   reads:  {}", builder.dependencies.join(", "));
        println!("   writes: {}", builder.outputs.join(", "));
    }
    Ok(())
}

fn print_status(config: &CbiConfig, json: bool) -> Result<(), BoxError> {
    let db = DatabaseManager::open(
        &config.database.effective_path(),
        config.database.effective_read_pool_size(),
    )?;

    let status = db.with_reader(|conn| {
        let sources = SOURCE_TABLES
            .iter()
            .map(|&table| match check_table_ready(conn, table) {
                Ok(()) => SourceStatus {
                    table: table.as_str(),
                    ready: true,
                    reason: None,
                },
                Err(e) => SourceStatus {
                    table: table.as_str(),
                    ready: false,
                    reason: Some(e.to_string()),
                },
            })
            .collect();
        let reports = REPORT_TABLES
            .iter()
            .map(|&table| {
                let rows = if catalog::table_exists(conn, table.as_str())? {
                    Some(catalog::row_count(conn, table)?)
                } else {
                    None
                };
                Ok(ReportStatus {
                    table: table.as_str(),
                    rows,
                })
            })
            .collect::<Result<Vec<_>, cbi_core::errors::StorageError>>()?;
        Ok::<_, cbi_core::errors::StorageError>(Status { sources, reports })
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }
    println!("source tables:");
    for source in &status.sources {
        match &source.reason {
            None => println!("  {:<32} ready", source.table),
            Some(reason) => println!("  {:<32} {reason}", source.table),
        }
    }
    println!("report tables:");
    for report in &status.reports {
        match report.rows {
            Some(rows) => println!("  {:<32} {rows} rows", report.table),
            None => println!("  {:<32} not built", report.table),
        }
    }
    Ok(())
}
