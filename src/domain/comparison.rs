use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::diff_report::DiffReport;
use crate::domain::fingerprint::fingerprint;
use crate::domain::snapshot::Snapshot;
use crate::domain::value_objects::Fingerprint;

/// One comparison run: the report plus enough context to present it.
#[derive(Debug, Serialize, Clone)]
pub struct Comparison {
    pub report_id: String,
    pub created_at: String,
    pub left: SnapshotInfo,
    pub right: SnapshotInfo,
    pub report: DiffReport,
    pub summary: Summary,
}

/// What a report needs to know about each compared snapshot.
#[derive(Debug, Serialize, Clone)]
pub struct SnapshotInfo {
    pub label: String,
    pub captured_at: DateTime<Utc>,
    pub fingerprint: Fingerprint,
    pub tables: usize,
    pub columns: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Summary {
    pub tables_compared: usize,
    pub tables_differing: usize,
    pub missing_tables: usize,
    pub missing_fields: usize,
    pub attribute_mismatches: usize,
    pub total: usize,
}

impl SnapshotInfo {
    pub fn of(snapshot: &Snapshot) -> Self {
        Self {
            label: snapshot.label.clone(),
            captured_at: snapshot.captured_at,
            fingerprint: fingerprint(snapshot),
            tables: snapshot.table_count(),
            columns: snapshot.column_count(),
        }
    }
}

impl Comparison {
    pub fn new(left: &Snapshot, right: &Snapshot, report: DiffReport) -> Self {
        let tables_compared = left
            .tables
            .keys()
            .chain(right.tables.keys().filter(|t| !left.tables.contains_key(*t)))
            .count();

        let discrepancies = || report.iter().flat_map(|(_, ds)| ds.iter());
        let missing_tables = discrepancies().filter(|d| d.is_missing_table()).count();
        let missing_fields = discrepancies().filter(|d| d.is_missing_field()).count();
        let attribute_mismatches = discrepancies().filter(|d| d.is_attribute_mismatch()).count();

        let summary = Summary {
            tables_compared,
            tables_differing: report.len(),
            missing_tables,
            missing_fields,
            attribute_mismatches,
            total: missing_tables + missing_fields + attribute_mismatches,
        };

        let now = Utc::now();
        Comparison {
            report_id: format!(
                "cmp_{}_{}",
                now.format("%Y%m%d_%H%M%S"),
                Uuid::new_v4().simple()
            ),
            created_at: now.to_rfc3339(),
            left: SnapshotInfo::of(left),
            right: SnapshotInfo::of(right),
            report,
            summary,
        }
    }

    pub fn has_drift(&self) -> bool {
        !self.report.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::compare::compare;
    use crate::domain::snapshot::{ColumnSchema, TableSchema};
    use indexmap::IndexMap;

    fn snapshot(label: &str, tables: &[(&str, &[&str])]) -> Snapshot {
        let tables: IndexMap<String, TableSchema> = tables
            .iter()
            .map(|(table, cols)| {
                let cols: TableSchema = cols
                    .iter()
                    .map(|c| (c.to_string(), ColumnSchema::new(*c, "int")))
                    .collect();
                (table.to_string(), cols)
            })
            .collect();
        Snapshot::new(label, tables)
    }

    #[test]
    fn report_id_carries_creation_timestamp() {
        let a = snapshot("a", &[]);
        let cmp = Comparison::new(&a, &a, compare(&a, &a));

        let created = DateTime::parse_from_rfc3339(&cmp.created_at).unwrap();
        let prefix = format!("cmp_{}_", created.format("%Y%m%d_%H%M%S"));
        assert!(cmp.report_id.starts_with(&prefix), "{} vs {}", cmp.report_id, prefix);
        assert_eq!(cmp.report_id.len(), prefix.len() + 32);
    }

    #[test]
    fn summary_counts_each_kind_of_discrepancy() {
        let a = snapshot("a", &[("users", &["id", "email"]), ("orders", &["id"])]);
        let b = snapshot("b", &[("users", &["id"]), ("audit", &[])]);
        let cmp = Comparison::new(&a, &b, compare(&a, &b));

        assert_eq!(
            cmp.summary,
            Summary {
                tables_compared: 3,
                tables_differing: 3,
                missing_tables: 2,
                missing_fields: 1,
                attribute_mismatches: 0,
                total: 3,
            }
        );
        assert!(cmp.has_drift());
        assert_eq!(cmp.left.columns, 3);
        assert_eq!(cmp.right.tables, 2);
    }
}
