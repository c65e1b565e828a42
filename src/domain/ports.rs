use crate::domain::{comparison::Comparison, snapshot::ColumnSchema};
use crate::infrastructure::config::DbConfig;
use anyhow::Result;
use async_trait::async_trait;

/// Port: opens a schema session against one database (implemented by SqlxConnector)
#[async_trait]
pub trait SchemaConnector: Send + Sync {
    async fn connect(&self, cfg: &DbConfig) -> Result<Box<dyn SchemaSession>>;
}

/// Port: one open connection used for introspection (implemented by SqlxSession)
///
/// Owned by a single extraction call; `close` is always called before the
/// session is dropped.
#[async_trait]
pub trait SchemaSession: Send {
    /// Names of all base tables, in the order the database reports them.
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Every column of `table`, in ordinal order.
    async fn describe_table(&mut self, table: &str) -> Result<Vec<ColumnSchema>>;

    async fn close(&mut self) -> Result<()>;
}

/// Port: output formatting (implemented by JsonWriter, TextWriter, HtmlWriter)
pub trait OutputWriter: Send + Sync {
    /// Serializes the comparison to a string (JSON, text, HTML, etc.)
    fn format(&self, comparison: &Comparison) -> Result<String>;
    /// Extension of the produced file (e.g. "json", "txt", "html")
    fn extension(&self) -> &'static str;
}
