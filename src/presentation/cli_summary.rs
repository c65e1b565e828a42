use crate::application::monitoring::PerfReport;
use crate::domain::comparison::Comparison;
use crate::domain::diff_report::Discrepancy;
use crate::domain::snapshot::Snapshot;
use crate::domain::value_objects::Fingerprint;
use colored::*;
use tabled::settings::{object::Columns, Alignment, Modify, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct TableRow {
    table: String,
    #[tabled(rename = "missing")]
    missing: String,
    #[tabled(rename = "fields missing")]
    fields: String,
    #[tabled(rename = "attributes differ")]
    attributes: String,
}

pub fn print_summary(cmp: &Comparison) {
    println!();

    println!("{}", "SCHEMADIFF SUMMARY".bold().cyan());
    println!(
        "{} ({}) ↔ {} ({})",
        cmp.left.label.blue(),
        cmp.left.fingerprint.short().dimmed(),
        cmp.right.label.green(),
        cmp.right.fingerprint.short().dimmed()
    );
    println!("Report: {}", cmp.report_id.bright_yellow());
    println!();

    if !cmp.has_drift() {
        println!(
            "{}",
            format!(
                "✓ No structural differences across {} table(s).",
                cmp.summary.tables_compared
            )
            .bold()
            .green()
        );
        println!();
        return;
    }

    let rows: Vec<TableRow> = cmp
        .report
        .iter()
        .map(|(table, ds)| {
            let count = |f: fn(&Discrepancy) -> bool| ds.iter().filter(|d| f(d)).count();
            TableRow {
                table: table.bold().to_string(),
                missing: if count(Discrepancy::is_missing_table) > 0 {
                    "yes".red().to_string()
                } else {
                    "".to_string()
                },
                fields: count(Discrepancy::is_missing_field).to_string().yellow().to_string(),
                attributes: count(Discrepancy::is_attribute_mismatch)
                    .to_string()
                    .yellow()
                    .to_string(),
            }
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..=3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    println!();

    for (table, ds) in cmp.report.iter() {
        println!("{}", table.bold());
        for d in ds {
            let line = d.to_string();
            let line = match d {
                Discrepancy::MissingTable { .. } => line.red(),
                Discrepancy::MissingField { .. } => line.yellow(),
                Discrepancy::AttributeMismatch { .. } => line.normal(),
            };
            println!("  • {line}");
        }
    }

    let s = &cmp.summary;
    println!();
    println!(
        "{} discrepancies in {} of {} table(s)",
        s.total.to_string().bold().red(),
        s.tables_differing.to_string().bold(),
        s.tables_compared
    );
    println!();
}

/// One line describing a freshly captured or loaded snapshot.
pub fn print_snapshot_line(snapshot: &Snapshot, fingerprint: &Fingerprint) {
    println!(
        "{} {}: {} table(s), {} column(s), fingerprint {}",
        "✓".green(),
        snapshot.label.bold(),
        snapshot.table_count(),
        snapshot.column_count(),
        fingerprint.short().dimmed()
    );
}

// ─── Performance summary ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PerfRow {
    operation: String,
    database: String,
    table: String,
    #[tabled(rename = "items")]
    items: String,
    #[tabled(rename = "time (ms)")]
    duration_ms: String,
}

/// Print an introspection timing table to stdout.
pub fn print_perf_summary(report: &PerfReport) {
    if report.timings.is_empty() {
        return;
    }

    println!("{}", "PERFORMANCE".bold().cyan());

    let rows: Vec<PerfRow> = report
        .timings
        .iter()
        .map(|t| PerfRow {
            operation: t.operation.dimmed().to_string(),
            database: t.database.clone(),
            table: t.table.bold().to_string(),
            items: t.items.to_string(),
            duration_ms: format_duration(t.duration_ms),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..=4)).with(Alignment::right()))
        .to_string();

    println!("{table}");

    println!(
        "  Total: {} quer(ies)  ·  {} ms elapsed",
        report.total_queries.to_string().bold(),
        format_duration(report.total_ms),
    );
    println!();
}

fn format_duration(ms: u128) -> String {
    if ms >= 1_000 {
        format!("{:.1}s", ms as f64 / 1_000.0).yellow().to_string()
    } else if ms >= 100 {
        ms.to_string().yellow().to_string()
    } else {
        ms.to_string().green().to_string()
    }
}
