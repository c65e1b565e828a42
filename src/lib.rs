use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// ─── Log level ────────────────────────────────────────────────────────────────

/// Controls the verbosity of schemadiff's internal tracing output.
///
/// Pass to [`init_tracing`] before calling any async entry point.
///
/// | Variant | `tracing` level | When to use                               |
/// |---------|-----------------|-------------------------------------------|
/// | `Error` | `error`         | `--quiet` / CI scripting                  |
/// | `Info`  | `info`          | Default, shows per-query timings          |
/// | `Debug` | `debug`         | `--verbose`, shows introspection SQL too  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Info,
    Debug,
}

/// Initialise the global `tracing` subscriber for schemadiff.
///
/// This is a convenience wrapper around `tracing_subscriber`. It respects
/// `RUST_LOG` when set, falling back to `level` otherwise.
///
/// Call this **once** at application startup. Library consumers who manage
/// their own subscriber should skip this and configure tracing themselves.
///
/// Only available when the `cli` feature is enabled (pulls in
/// `tracing-subscriber`).
#[cfg(feature = "cli")]
pub fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;

    let default_filter = match level {
        LogLevel::Error => "schemadiff=error",
        LogLevel::Info => "schemadiff=info",
        LogLevel::Debug => "schemadiff=debug",
    };

    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

// ─── Public API Facade ───

pub use application::monitoring::PerfReport;
pub use domain::comparison::{Comparison, SnapshotInfo, Summary};
pub use domain::diff_report::{DiffReport, Discrepancy};
pub use domain::error::ExtractError;
pub use domain::fingerprint::fingerprint;
pub use domain::ports::{SchemaConnector, SchemaSession};
pub use domain::snapshot::{Attribute, ColumnSchema, Snapshot, TableSchema};
pub use domain::value_objects::Fingerprint;
pub use infrastructure::config::{AppConfig, DbConfig, OutputConfig};

use crate::application::extract::ExtractService;
use crate::application::monitoring::MonitoringConnector;
use crate::infrastructure::db::client::SqlxConnector;
use crate::infrastructure::snapshot_store;

// ─── Public entry points ───

/// Capture the schema of the database described by `cfg`.
///
/// Opens one connection, reads every base table and its columns, and closes
/// the connection before returning. Fails with [`ExtractError::Connection`]
/// when the database cannot be reached or selected; no partial snapshot is
/// ever returned.
pub async fn export(cfg: &DbConfig, label: &str) -> Result<Snapshot, ExtractError> {
    let (snapshot, _) = export_with_timing(cfg, label).await?;
    Ok(snapshot)
}

/// Capture a snapshot and return a [`PerfReport`] of the introspection queries.
pub async fn export_with_timing(
    cfg: &DbConfig,
    label: &str,
) -> Result<(Snapshot, PerfReport), ExtractError> {
    let report = PerfReport::new();
    let connector = Arc::new(MonitoringConnector::new(
        Arc::new(SqlxConnector),
        Arc::clone(&report),
    ));

    let snapshot = ExtractService::new(connector).export(cfg, label).await?;

    Ok((snapshot, PerfReport::snapshot(&report)))
}

/// Compare two snapshots. See [`application::compare::compare`].
pub fn compare(left: &Snapshot, right: &Snapshot) -> DiffReport {
    application::compare::compare(left, right)
}

/// Compare two snapshots and wrap the report with per-side context for output.
pub fn compare_snapshots(left: &Snapshot, right: &Snapshot) -> Comparison {
    Comparison::new(left, right, compare(left, right))
}

/// Capture `source` then `target` and compare them.
///
/// Labels come from each `DbConfig` (falling back to the database name).
/// If either capture fails no comparison is attempted.
pub async fn run(cfg: &AppConfig) -> Result<Comparison> {
    let (comparison, _) = run_with_timing(cfg).await?;
    Ok(comparison)
}

/// Same as [`run`], with the introspection timings of both captures.
pub async fn run_with_timing(cfg: &AppConfig) -> Result<(Comparison, PerfReport)> {
    let report = PerfReport::new();
    let service = ExtractService::new(Arc::new(MonitoringConnector::new(
        Arc::new(SqlxConnector),
        Arc::clone(&report),
    )));

    let source = service
        .export(&cfg.source, cfg.source.label())
        .await
        .with_context(|| format!("Could not capture a snapshot for {}", cfg.source.label()))?;
    let target = service
        .export(&cfg.target, cfg.target.label())
        .await
        .with_context(|| format!("Could not capture a snapshot for {}", cfg.target.label()))?;

    let comparison = compare_snapshots(&source, &target);
    Ok((comparison, PerfReport::snapshot(&report)))
}

/// Write a snapshot to `path` as JSON.
pub fn save_snapshot(snapshot: &Snapshot, path: impl AsRef<Path>) -> Result<()> {
    snapshot_store::save(snapshot, path)
}

/// Read and validate a snapshot previously written by [`save_snapshot`].
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Snapshot> {
    snapshot_store::load(path)
}
