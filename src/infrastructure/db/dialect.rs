use anyhow::{bail, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A SQL statement plus its positional text parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectionQuery {
    pub sql: &'static str,
    pub binds: Vec<String>,
}

impl IntrospectionQuery {
    fn new(sql: &'static str, binds: &[&str]) -> Self {
        Self {
            sql,
            binds: binds.iter().map(|b| b.to_string()).collect(),
        }
    }
}

/// Per-driver catalog queries.
///
/// Every dialect's column query returns exactly six text columns, in order:
/// `Field`, `Type`, `Null` (`YES`/`NO`), `Key` (`PRI`/`UNI`/`MUL`/empty),
/// `Default` (nullable) and `Extra`, one row per column in ordinal order.
/// Table listings return base tables only, one name per row.
pub trait IntrospectionDialect: Send + Sync {
    /// Return the driver name as a lowercase string ("postgres", "mysql", …).
    fn name(&self) -> &'static str;

    /// Query listing every base table in `namespace`.
    fn list_tables(&self, namespace: &str) -> IntrospectionQuery;

    /// Query describing every column of `table` in `namespace`.
    fn describe_table(&self, namespace: &str, table: &str) -> IntrospectionQuery;

    /// Bring a raw `Default` value to the form `SHOW COLUMNS` reports.
    fn column_default(&self, raw: Option<String>) -> Option<String> {
        raw
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MySQL / MariaDB
// ─────────────────────────────────────────────────────────────────────────────

/// Reads `information_schema`, which carries the same values `SHOW COLUMNS` reports.
pub struct MysqlDialect;

impl IntrospectionDialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn list_tables(&self, namespace: &str) -> IntrospectionQuery {
        IntrospectionQuery::new(
            "SELECT table_name \
             FROM information_schema.tables \
             WHERE table_schema = ? AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
            &[namespace],
        )
    }

    fn describe_table(&self, namespace: &str, table: &str) -> IntrospectionQuery {
        IntrospectionQuery::new(
            "SELECT column_name AS `Field`, column_type AS `Type`, is_nullable AS `Null`, \
                    column_key AS `Key`, column_default AS `Default`, extra AS `Extra` \
             FROM information_schema.columns \
             WHERE table_schema = ? AND table_name = ? \
             ORDER BY ordinal_position",
            &[namespace, table],
        )
    }
}

/// Same catalog tables as MySQL, but since 10.2.7 `column_default` holds the
/// default as an SQL expression: `NULL` for no default and quoted literals
/// (`'abc'`, `'it''s'`).
pub struct MariadbDialect;

impl IntrospectionDialect for MariadbDialect {
    fn name(&self) -> &'static str {
        "mariadb"
    }

    fn list_tables(&self, namespace: &str) -> IntrospectionQuery {
        MysqlDialect.list_tables(namespace)
    }

    fn describe_table(&self, namespace: &str, table: &str) -> IntrospectionQuery {
        MysqlDialect.describe_table(namespace, table)
    }

    fn column_default(&self, raw: Option<String>) -> Option<String> {
        let raw = raw?;
        if raw == "NULL" {
            return None;
        }
        let literal = raw
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .map(|s| s.replace("''", "'"));
        Some(literal.unwrap_or(raw))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ─────────────────────────────────────────────────────────────────────────────

/// Maps `pg_catalog` onto the MySQL attribute vocabulary. `Type` is the full
/// declaration from `format_type` (enum and domain names, array element types,
/// precision). `Key` follows MySQL's rules: `PRI` for any primary-key column,
/// `UNI` for a single-column unique index, `MUL` for the leading column of any
/// other index. Identity and serial columns report `auto_increment`.
pub struct PostgresDialect;

impl IntrospectionDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn list_tables(&self, namespace: &str) -> IntrospectionQuery {
        IntrospectionQuery::new(
            "SELECT table_name::TEXT \
             FROM information_schema.tables \
             WHERE table_schema = $1 AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
            &[namespace],
        )
    }

    fn describe_table(&self, namespace: &str, table: &str) -> IntrospectionQuery {
        IntrospectionQuery::new(
            "SELECT a.attname::TEXT AS \"Field\", \
                    pg_catalog.format_type(a.atttypid, a.atttypmod)::TEXT AS \"Type\", \
                    (CASE WHEN a.attnotnull THEN 'NO' ELSE 'YES' END)::TEXT AS \"Null\", \
                    COALESCE(( \
                        SELECT CASE \
                                   WHEN i.indisprimary THEN 'PRI' \
                                   WHEN i.indisunique AND i.indnatts = 1 THEN 'UNI' \
                                   ELSE 'MUL' \
                               END \
                        FROM pg_catalog.pg_index i \
                        WHERE i.indrelid = a.attrelid \
                          AND (i.indkey[0] = a.attnum \
                               OR (i.indisprimary AND a.attnum = ANY(i.indkey::int2[]))) \
                        ORDER BY CASE \
                                     WHEN i.indisprimary THEN 0 \
                                     WHEN i.indisunique AND i.indnatts = 1 THEN 1 \
                                     ELSE 2 \
                                 END \
                        LIMIT 1 \
                    ), '')::TEXT AS \"Key\", \
                    pg_catalog.pg_get_expr(d.adbin, d.adrelid)::TEXT AS \"Default\", \
                    (CASE \
                        WHEN a.attidentity <> '' \
                          OR pg_catalog.pg_get_expr(d.adbin, d.adrelid) LIKE 'nextval(%' \
                            THEN 'auto_increment' \
                        ELSE '' \
                    END)::TEXT AS \"Extra\" \
             FROM pg_catalog.pg_attribute a \
             JOIN pg_catalog.pg_class c ON c.oid = a.attrelid \
             JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
             LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum \
             WHERE n.nspname = $1 AND c.relname = $2 \
               AND a.attnum > 0 AND NOT a.attisdropped \
             ORDER BY a.attnum",
            &[namespace, table],
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite
// ─────────────────────────────────────────────────────────────────────────────

/// No namespaces: the database file is the schema.
pub struct SqliteDialect;

impl IntrospectionDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn list_tables(&self, _namespace: &str) -> IntrospectionQuery {
        IntrospectionQuery::new(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
            &[],
        )
    }

    fn describe_table(&self, _namespace: &str, table: &str) -> IntrospectionQuery {
        IntrospectionQuery::new(
            "SELECT name AS \"Field\", \
                    type AS \"Type\", \
                    CASE WHEN \"notnull\" = 0 THEN 'YES' ELSE 'NO' END AS \"Null\", \
                    CASE WHEN pk > 0 THEN 'PRI' ELSE '' END AS \"Key\", \
                    dflt_value AS \"Default\", \
                    '' AS \"Extra\" \
             FROM pragma_table_info(?) \
             ORDER BY cid",
            &[table],
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Factory
// ─────────────────────────────────────────────────────────────────────────────

pub fn from_driver(driver: &str) -> Result<Box<dyn IntrospectionDialect>> {
    Ok(match driver {
        "mysql" => Box::new(MysqlDialect),
        "mariadb" => Box::new(MariadbDialect),
        "postgres" => Box::new(PostgresDialect),
        "sqlite" => Box::new(SqliteDialect),
        other => bail!("Unsupported driver '{other}' (expected mysql, mariadb, postgres or sqlite)"),
    })
}
