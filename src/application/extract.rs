use anyhow::Result;
use chrono::Utc;
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::domain::{
    error::ExtractError,
    ports::{SchemaConnector, SchemaSession},
    snapshot::{Snapshot, TableSchema},
};
use crate::infrastructure::config::DbConfig;

// ─────────────────────────────────────────────────────────────────────────────
// ExtractService
// ─────────────────────────────────────────────────────────────────────────────

/// Captures the table/column structure of one database into a [`Snapshot`].
///
/// Each call opens its own session through the connector, lists every table,
/// describes each one in turn (one query per table), and closes the session
/// before returning, whether or not introspection succeeded. A failure at any
/// point yields an error and no snapshot.
pub struct ExtractService {
    connector: Arc<dyn SchemaConnector>,
}

impl ExtractService {
    pub fn new(connector: Arc<dyn SchemaConnector>) -> Self {
        Self { connector }
    }

    pub async fn export(&self, cfg: &DbConfig, label: &str) -> Result<Snapshot, ExtractError> {
        let target = cfg.display_target();
        let start = Instant::now();

        let mut session =
            self.connector
                .connect(cfg)
                .await
                .map_err(|e| ExtractError::Connection {
                    target: target.clone(),
                    source: e.into(),
                })?;

        let captured_at = Utc::now();
        let captured = capture(session.as_mut()).await;

        if let Err(e) = session.close().await {
            warn!(db = %target, error = %e, "failed to close connection");
        }

        let tables = captured.map_err(|e| ExtractError::Introspection {
            target: target.clone(),
            source: e.into(),
        })?;

        let snapshot = Snapshot::captured(label, captured_at, tables);
        info!(
            db = %target,
            label,
            tables = snapshot.table_count(),
            columns = snapshot.column_count(),
            duration_ms = start.elapsed().as_millis(),
            "snapshot captured"
        );
        Ok(snapshot)
    }
}

async fn capture(session: &mut dyn SchemaSession) -> Result<IndexMap<String, TableSchema>> {
    let names = session.list_tables().await?;
    let mut tables = IndexMap::with_capacity(names.len());

    for name in names {
        let columns: TableSchema = session
            .describe_table(&name)
            .await?
            .into_iter()
            .map(|col| (col.field.clone(), col))
            .collect();
        tables.insert(name, columns);
    }

    Ok(tables)
}
