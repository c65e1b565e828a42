use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::AnyConnection;
use sqlx::Connection;
use tracing::debug;

use crate::domain::ports::{SchemaConnector, SchemaSession};
use crate::domain::snapshot::ColumnSchema;
use crate::infrastructure::config::DbConfig;
use crate::infrastructure::db::dialect::{from_driver, IntrospectionDialect, IntrospectionQuery};

/// Opens one dedicated `AnyConnection` per session. No pool, no shared state.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlxConnector;

pub struct SqlxSession {
    conn: Option<AnyConnection>,
    dialect: Box<dyn IntrospectionDialect>,
    namespace: String,
}

#[async_trait]
impl SchemaConnector for SqlxConnector {
    /// Connect to the database described in `cfg`. The database name is part
    /// of the URL, so an unknown database fails here too.
    async fn connect(&self, cfg: &DbConfig) -> Result<Box<dyn SchemaSession>> {
        sqlx::any::install_default_drivers();

        let dialect = from_driver(&cfg.driver)?;

        let conn = AnyConnection::connect(&cfg.url())
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to {} (driver: {})",
                    cfg.name, cfg.driver
                )
            })?;

        debug!(
            "Connected to {}/{} via {} driver",
            cfg.host, cfg.name, cfg.driver
        );

        Ok(Box::new(SqlxSession {
            conn: Some(conn),
            dialect,
            namespace: cfg.namespace().to_string(),
        }))
    }
}

impl SqlxSession {
    async fn fetch(&mut self, query: &IntrospectionQuery) -> Result<Vec<AnyRow>> {
        let conn = self
            .conn
            .as_mut()
            .context("Connection already closed")?;

        debug!("Executing: {}", query.sql);

        let mut q = sqlx::query(query.sql);
        for bind in &query.binds {
            q = q.bind(bind.as_str());
        }
        Ok(q.fetch_all(&mut *conn).await?)
    }
}

#[async_trait]
impl SchemaSession for SqlxSession {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        let query = self.dialect.list_tables(&self.namespace);
        let rows = self
            .fetch(&query)
            .await
            .with_context(|| format!("Failed to list tables of {}", self.namespace))?;

        rows.iter().map(|row| blob_or_string(row, 0)).collect()
    }

    async fn describe_table(&mut self, table: &str) -> Result<Vec<ColumnSchema>> {
        let query = self.dialect.describe_table(&self.namespace, table);
        let rows = self
            .fetch(&query)
            .await
            .with_context(|| format!("Failed to describe table {}", table))?;

        rows.iter()
            .map(|row| row_to_column(row, self.dialect.as_ref()))
            .collect()
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().await.context("Failed to close connection")?;
        }
        Ok(())
    }
}

/// Map one six-column introspection row onto a `ColumnSchema`.
fn row_to_column(row: &AnyRow, dialect: &dyn IntrospectionDialect) -> Result<ColumnSchema> {
    Ok(ColumnSchema {
        field: blob_or_string(row, 0)?,
        r#type: blob_or_string(row, 1)?,
        null: blob_or_string(row, 2)?,
        key: optional_blob_or_string(row, 3)?.unwrap_or_default(),
        default: dialect.column_default(optional_blob_or_string(row, 4)?),
        extra: optional_blob_or_string(row, 5)?.unwrap_or_default(),
    })
}

/// Read a column from an AnyRow as String, handling MySQL's habit of returning
/// information_schema string columns as BLOB to sqlx AnyRow.
fn blob_or_string(row: &AnyRow, idx: usize) -> Result<String> {
    Ok(optional_blob_or_string(row, idx)?.unwrap_or_default())
}

fn optional_blob_or_string(row: &AnyRow, idx: usize) -> Result<Option<String>> {
    use sqlx::{Column, Row, TypeInfo, ValueRef};

    if row.try_get_raw(idx)?.is_null() {
        return Ok(None);
    }

    let type_name = row.column(idx).type_info().name();
    if type_name == "BLOB" {
        let bytes: Vec<u8> = row.try_get(idx)?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    } else {
        Ok(Some(row.try_get(idx)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Executor;

    async fn sqlite_fixture(statements: &[&str]) -> (tempfile::TempDir, DbConfig) {
        sqlx::any::install_default_drivers();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());

        let mut conn = AnyConnection::connect(&url).await.unwrap();
        for stmt in statements {
            conn.execute(*stmt).await.unwrap();
        }
        conn.close().await.unwrap();

        let cfg = DbConfig {
            driver: "sqlite".into(),
            host: String::new(),
            port: None,
            name: path.display().to_string(),
            user: String::new(),
            password: String::new(),
            schema: None,
            label: None,
        };
        (dir, cfg)
    }

    #[tokio::test]
    async fn sqlite_session_lists_tables_and_columns() {
        let (_dir, cfg) = sqlite_fixture(&[
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                email VARCHAR(255) NOT NULL,
                score INT DEFAULT 0,
                bio TEXT
            )",
            "CREATE TABLE accounts (id INTEGER PRIMARY KEY)",
            "CREATE VIEW user_emails AS SELECT email FROM users",
        ])
        .await;

        let mut session = SqlxConnector.connect(&cfg).await.unwrap();
        let tables = session.list_tables().await.unwrap();
        assert_eq!(tables, ["accounts", "users"]);

        let cols = session.describe_table("users").await.unwrap();
        session.close().await.unwrap();

        let names: Vec<_> = cols.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(names, ["id", "email", "score", "bio"]);

        assert_eq!(cols[0].r#type, "INTEGER");
        assert_eq!(cols[0].key, "PRI");
        assert_eq!(cols[1].r#type, "VARCHAR(255)");
        assert_eq!(cols[1].null, "NO");
        assert_eq!(cols[1].key, "");
        assert_eq!(cols[2].default.as_deref(), Some("0"));
        assert_eq!(cols[3].default, None);
        assert_eq!(cols[3].null, "YES");
    }

    #[tokio::test]
    async fn closing_twice_is_harmless() {
        let (_dir, cfg) = sqlite_fixture(&["CREATE TABLE t (id INTEGER)"]).await;
        let mut session = SqlxConnector.connect(&cfg).await.unwrap();
        session.close().await.unwrap();
        session.close().await.unwrap();
        assert!(session.list_tables().await.is_err());
    }

    #[tokio::test]
    async fn unknown_driver_fails_to_connect() {
        let cfg = DbConfig {
            driver: "oracle".into(),
            host: "localhost".into(),
            port: None,
            name: "x".into(),
            user: String::new(),
            password: String::new(),
            schema: None,
            label: None,
        };
        let err = SqlxConnector.connect(&cfg).await.err().unwrap().to_string();
        assert!(err.contains("oracle"), "got: {err}");
    }

    #[test]
    fn encoded_credentials_survive_url_parsing() {
        use sqlx::postgres::PgConnectOptions;

        let cfg = DbConfig {
            driver: "postgres".into(),
            host: "db.internal".into(),
            port: Some(6432),
            name: "shop".into(),
            user: "app@ops".into(),
            password: "p/ss#1?".into(),
            schema: None,
            label: None,
        };
        let opts: PgConnectOptions = cfg.url().parse().unwrap();
        assert_eq!(opts.get_host(), "db.internal");
        assert_eq!(opts.get_port(), 6432);
        assert_eq!(opts.get_username(), "app@ops");
        assert_eq!(opts.get_database(), Some("shop"));
    }

    /// Live server settings from `SCHEMADIFF_TEST_PG_HOST`, `_PORT`, `_NAME`,
    /// `_USER` and `_PASSWORD`. `None` (test skipped) when `_NAME` is unset.
    fn postgres_config() -> Option<DbConfig> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("SCHEMADIFF_TEST_PG").try_parsing(true))
            .set_override("driver", "postgres")
            .ok()?
            .build()
            .ok()?
            .try_deserialize()
            .ok()
    }

    #[tokio::test]
    async fn postgres_session_reports_declared_types_and_indexes() {
        let Some(base) = postgres_config() else {
            return;
        };
        sqlx::any::install_default_drivers();

        let ns = format!("schemadiff_{}", uuid::Uuid::new_v4().simple());
        let mut admin = AnyConnection::connect(&base.url()).await.unwrap();
        for stmt in [
            format!("CREATE SCHEMA {ns}"),
            format!("CREATE TYPE {ns}.mood AS ENUM ('ok', 'sad')"),
            format!(
                "CREATE TABLE {ns}.t (
                    id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                    m {ns}.mood,
                    arr INT[],
                    ts TIMESTAMP(3) NOT NULL,
                    name TEXT DEFAULT 'anon',
                    code VARCHAR(12) UNIQUE
                )"
            ),
            format!("CREATE INDEX t_name_idx ON {ns}.t (name)"),
        ] {
            admin.execute(stmt.as_str()).await.unwrap();
        }

        let cfg = DbConfig {
            schema: Some(ns.clone()),
            ..base
        };
        let mut session = SqlxConnector.connect(&cfg).await.unwrap();
        let tables = session.list_tables().await;
        let cols = session.describe_table("t").await;
        session.close().await.unwrap();

        admin
            .execute(format!("DROP SCHEMA {ns} CASCADE").as_str())
            .await
            .unwrap();
        admin.close().await.unwrap();

        assert_eq!(tables.unwrap(), ["t"]);
        let cols = cols.unwrap();
        let col = |name: &str| cols.iter().find(|c| c.field == name).unwrap();

        assert_eq!(col("id").r#type, "bigint");
        assert_eq!(col("id").key, "PRI");
        assert_eq!(col("id").null, "NO");
        assert_eq!(col("id").extra, "auto_increment");
        assert!(col("m").r#type.ends_with("mood"), "got: {}", col("m").r#type);
        assert_eq!(col("arr").r#type, "integer[]");
        assert_eq!(col("ts").r#type, "timestamp(3) without time zone");
        assert_eq!(col("ts").null, "NO");
        assert_eq!(col("name").key, "MUL");
        assert_eq!(col("name").default.as_deref(), Some("'anon'::text"));
        assert_eq!(col("code").r#type, "character varying(12)");
        assert_eq!(col("code").key, "UNI");
    }
}
