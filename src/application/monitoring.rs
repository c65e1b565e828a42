use crate::domain::ports::{SchemaConnector, SchemaSession};
use crate::domain::snapshot::ColumnSchema;
use crate::infrastructure::config::DbConfig;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, instrument};

// ─── PerfReport ──────────────────────────────────────────────────────────────

/// A single timed operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OpTiming {
    /// Operation name: "connect", "list_tables" or "describe_table".
    pub operation: &'static str,
    /// Database (`driver://host/name`) the operation ran against.
    pub database: String,
    /// Table described, empty for database-level operations.
    pub table: String,
    /// Elapsed wall time in milliseconds.
    pub duration_ms: u128,
    /// Number of items returned (tables listed or columns described).
    pub items: usize,
}

/// Accumulated introspection timings for one extraction run.
///
/// Shared across all decorator instances for one run via `Arc<Mutex<_>>`.
/// After the run, pass to [`crate::presentation::cli_summary::print_perf_summary`]
/// to render a human-readable table.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct PerfReport {
    pub timings: Vec<OpTiming>,
    pub total_queries: usize,
    pub total_ms: u128,
}

impl PerfReport {
    pub fn new() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::default()))
    }

    /// Copy out the current state of a shared report.
    pub fn snapshot(report: &Arc<Mutex<Self>>) -> Self {
        report.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(report: &Arc<Mutex<Self>>, timing: OpTiming) {
        if let Ok(mut r) = report.lock() {
            r.total_ms += timing.duration_ms;
            if timing.operation != "connect" {
                r.total_queries += 1;
            }
            r.timings.push(timing);
        }
    }
}

// ─── MonitoringConnector ─────────────────────────────────────────────────────

/// Decorator: wraps any `SchemaConnector`, times the connection, and wraps
/// every session it opens in a [`MonitoringSession`].
pub struct MonitoringConnector {
    inner: Arc<dyn SchemaConnector>,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringConnector {
    pub fn new(inner: Arc<dyn SchemaConnector>, report: Arc<Mutex<PerfReport>>) -> Self {
        Self { inner, report }
    }
}

#[async_trait]
impl SchemaConnector for MonitoringConnector {
    #[instrument(
        name = "connect",
        skip(self, cfg),
        fields(db.driver = %cfg.driver, db.name = %cfg.name),
        level = "info"
    )]
    async fn connect(&self, cfg: &DbConfig) -> Result<Box<dyn SchemaSession>> {
        let database = cfg.display_target();
        let start = Instant::now();
        let session = self.inner.connect(cfg).await?;
        let duration_ms = start.elapsed().as_millis();

        info!(database = %database, duration_ms, "connect completed");

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "connect",
                database: database.clone(),
                table: String::new(),
                duration_ms,
                items: 0,
            },
        );

        Ok(Box::new(MonitoringSession {
            inner: session,
            database,
            report: Arc::clone(&self.report),
        }))
    }
}

// ─── MonitoringSession ───────────────────────────────────────────────────────

/// Decorator: wraps any `SchemaSession`, measures wall time per introspection
/// query, and appends the result to the shared `PerfReport`.
pub struct MonitoringSession {
    inner: Box<dyn SchemaSession>,
    database: String,
    report: Arc<Mutex<PerfReport>>,
}

#[async_trait]
impl SchemaSession for MonitoringSession {
    #[instrument(
        name = "list_tables",
        skip(self),
        fields(db = %self.database),
        level = "info"
    )]
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        let start = Instant::now();
        let tables = self.inner.list_tables().await?;
        let duration_ms = start.elapsed().as_millis();

        info!(tables = tables.len(), duration_ms, "list_tables completed");

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "list_tables",
                database: self.database.clone(),
                table: String::new(),
                duration_ms,
                items: tables.len(),
            },
        );

        Ok(tables)
    }

    #[instrument(
        name = "describe_table",
        skip(self),
        fields(db = %self.database, db.table = %table),
        level = "info"
    )]
    async fn describe_table(&mut self, table: &str) -> Result<Vec<ColumnSchema>> {
        let start = Instant::now();
        let columns = self.inner.describe_table(table).await?;
        let duration_ms = start.elapsed().as_millis();

        info!(table, columns = columns.len(), duration_ms, "describe_table completed");

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "describe_table",
                database: self.database.clone(),
                table: table.to_string(),
                duration_ms,
                items: columns.len(),
            },
        );

        Ok(columns)
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await
    }
}
