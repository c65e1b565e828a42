use indexmap::IndexSet;
use tracing::debug;

use crate::domain::{
    diff_report::{DiffReport, Discrepancy},
    snapshot::{Attribute, ColumnSchema, Snapshot, TableSchema},
};

// ─── Schema comparison ───

/// Compare two snapshots and report every structural difference, grouped by table.
///
/// Tables are visited in first-appearance order across `left` then `right`,
/// and columns likewise within each shared table, so the report is
/// reproducible run to run. A table (or column) missing on one side yields a
/// single discrepancy and nothing else is compared for it. A column present
/// on both sides yields one discrepancy per differing attribute.
///
/// Pure: no I/O, inputs are only borrowed.
pub fn compare(left: &Snapshot, right: &Snapshot) -> DiffReport {
    let mut report = DiffReport::new();
    let tables = ordered_union(left.tables.keys(), right.tables.keys());

    for table in &tables {
        let discrepancies = match (left.tables.get(*table), right.tables.get(*table)) {
            (None, _) => vec![Discrepancy::MissingTable {
                label: left.label.clone(),
                table: table.to_string(),
            }],
            (_, None) => vec![Discrepancy::MissingTable {
                label: right.label.clone(),
                table: table.to_string(),
            }],
            (Some(l), Some(r)) => compare_tables(left, l, right, r),
        };
        report.record(table, discrepancies);
    }

    debug!(
        left = %left.label,
        right = %right.label,
        tables = tables.len(),
        differing = report.len(),
        "compared snapshots"
    );

    report
}

fn compare_tables(
    left: &Snapshot,
    left_cols: &TableSchema,
    right: &Snapshot,
    right_cols: &TableSchema,
) -> Vec<Discrepancy> {
    let mut out = Vec::new();

    for field in ordered_union(left_cols.keys(), right_cols.keys()) {
        match (left_cols.get(field), right_cols.get(field)) {
            (None, _) => out.push(Discrepancy::MissingField {
                label: left.label.clone(),
                field: field.to_string(),
            }),
            (_, None) => out.push(Discrepancy::MissingField {
                label: right.label.clone(),
                field: field.to_string(),
            }),
            (Some(l), Some(r)) => compare_columns(field, left, l, right, r, &mut out),
        }
    }

    out
}

fn compare_columns(
    field: &str,
    left: &Snapshot,
    left_col: &ColumnSchema,
    right: &Snapshot,
    right_col: &ColumnSchema,
    out: &mut Vec<Discrepancy>,
) {
    for attr in Attribute::ALL {
        let l = left_col.attribute(attr);
        let r = right_col.attribute(attr);
        if values_match(attr, l, r) {
            continue;
        }
        out.push(Discrepancy::AttributeMismatch {
            field: field.to_string(),
            attribute: attr,
            left_label: left.label.clone(),
            left: l.map(str::to_string),
            right_label: right.label.clone(),
            right: r.map(str::to_string),
        });
    }
}

/// Keys of `left` in order, then any keys of `right` not already seen.
fn ordered_union<'a>(
    left: impl Iterator<Item = &'a String>,
    right: impl Iterator<Item = &'a String>,
) -> IndexSet<&'a str> {
    left.chain(right).map(String::as_str).collect()
}

// ─── Attribute equality ───

/// Strict text equality, except that numeric attributes whose values both
/// parse as finite numbers compare by value. An absent value only matches
/// another absent value.
fn values_match(attr: Attribute, left: Option<&str>, right: Option<&str>) -> bool {
    match (left, right) {
        (Some(l), Some(r)) if l == r => true,
        (Some(l), Some(r)) if attr.is_numeric() => match (as_number(l), as_number(r)) {
            (Some(a), Some(b)) => float_eq(a, b),
            _ => false,
        },
        (l, r) => l == r,
    }
}

fn as_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn float_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
