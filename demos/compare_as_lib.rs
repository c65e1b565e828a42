//! # Schemadiff: library usage example
//!
//! Shows three common patterns for consuming schemadiff as a Rust library:
//!
//! 1. **From a config file**: capture both databases and compare, like the CLI
//! 2. **From snapshot files**: compare exports taken at different times
//! 3. **Synthetic snapshots**: build snapshots in code and inspect the report
//!
//! Run with a config file:
//!   cargo run --features mysql --example compare_as_lib -- schemadiff.toml
//!
//! Compare two exported snapshots:
//!   cargo run --example compare_as_lib -- staging.json production.json
//!
//! Run the synthetic walkthrough (no database needed):
//!   cargo run --example compare_as_lib

use anyhow::Result;
use indexmap::IndexMap;
use schemadiff::{
    domain::ports::OutputWriter, presentation::writers::writer_for, AppConfig, ColumnSchema,
    Discrepancy, Snapshot, TableSchema,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match (args.get(1), args.get(2)) {
        (Some(left), Some(right)) => from_snapshot_files(left, right),
        (Some(path), None) => from_config_file(path).await,
        _ => synthetic(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 1: load config from a TOML file (same as `schemadiff compare`)
// ─────────────────────────────────────────────────────────────────────────────
async fn from_config_file(path: &str) -> Result<()> {
    println!("=== Pattern 1: from config file ({path}) ===\n");

    let cfg = AppConfig::load(path)?;
    let comparison = schemadiff::run(&cfg).await?;

    let text = writer_for("txt").expect("text writer always available");
    println!("{}", text.format(&comparison)?);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 2: compare snapshots exported earlier (`schemadiff export`)
// ─────────────────────────────────────────────────────────────────────────────
fn from_snapshot_files(left: &str, right: &str) -> Result<()> {
    println!("=== Pattern 2: from snapshot files ===\n");

    let left = schemadiff::load_snapshot(left)?;
    let right = schemadiff::load_snapshot(right)?;

    if schemadiff::fingerprint(&left) == schemadiff::fingerprint(&right) {
        println!("Fingerprints match: {} and {} are identical.", left.label, right.label);
        return Ok(());
    }

    let report = schemadiff::compare(&left, &right);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 3: build snapshots in code and walk the structured report.
// Snapshots are plain serialisable data; the comparator never needs a database.
// ─────────────────────────────────────────────────────────────────────────────
fn synthetic() -> Result<()> {
    println!("=== Pattern 3: synthetic snapshots ===\n");

    let expected = snapshot(
        "migration-expected",
        vec![
            (
                "users",
                vec![
                    ColumnSchema::new("id", "int(11) unsigned")
                        .not_null()
                        .key("PRI")
                        .extra("auto_increment"),
                    ColumnSchema::new("email", "varchar(255)").not_null().key("UNI"),
                    ColumnSchema::new("status", "tinyint(1)").default_value("0"),
                ],
            ),
            ("sessions", vec![ColumnSchema::new("token", "char(64)").key("PRI")]),
        ],
    );

    let actual = snapshot(
        "migration-actual",
        vec![(
            "users",
            vec![
                ColumnSchema::new("id", "bigint(20) unsigned")
                    .not_null()
                    .key("PRI")
                    .extra("auto_increment"),
                ColumnSchema::new("email", "varchar(255)").not_null().key("UNI"),
                ColumnSchema::new("status", "tinyint(1)").default_value("0.0"),
            ],
        )],
    );

    let report = schemadiff::compare(&expected, &actual);

    for (table, discrepancies) in report.iter() {
        println!("━━ {table} ━━");
        for d in discrepancies {
            match d {
                Discrepancy::AttributeMismatch { field, attribute, .. } => {
                    println!("  ~ {field}.{attribute}: {d}");
                }
                _ => println!("  ! {d}"),
            }
        }
        println!();
    }

    // Example: gate a deployment on drift
    if !report.is_empty() {
        eprintln!(
            "⚠  {} discrepancy(ies) across {} table(s): the migration did not produce the expected schema.",
            report.discrepancy_count(),
            report.len()
        );
    }

    Ok(())
}

fn snapshot(label: &str, tables: Vec<(&str, Vec<ColumnSchema>)>) -> Snapshot {
    let tables: IndexMap<String, TableSchema> = tables
        .into_iter()
        .map(|(name, cols)| {
            let cols = cols.into_iter().map(|c| (c.field.clone(), c)).collect();
            (name.to_string(), cols)
        })
        .collect();
    Snapshot::new(label, tables)
}
