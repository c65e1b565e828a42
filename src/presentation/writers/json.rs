use anyhow::Result;
use serde::Serialize;

use crate::domain::{
    comparison::{Comparison, SnapshotInfo, Summary},
    diff_report::DiffReport,
    ports::OutputWriter,
};

// ─── Serialisation view ───────────────────────────────────────────────────────
//
// Mirrors `Comparison` and adds a top-level `has_drift` flag so consumers
// (CI gates, dashboards) don't have to inspect the report themselves.

#[derive(Serialize)]
struct JsonComparison<'a> {
    report_id: &'a str,
    created_at: &'a str,
    has_drift: bool,
    left: &'a SnapshotInfo,
    right: &'a SnapshotInfo,
    summary: &'a Summary,
    /// table name → human-readable messages
    report: &'a DiffReport,
}

// ─── Writer ───────────────────────────────────────────────────────────────────

pub struct JsonWriter;

impl OutputWriter for JsonWriter {
    fn format(&self, cmp: &Comparison) -> Result<String> {
        let view = JsonComparison {
            report_id: &cmp.report_id,
            created_at: &cmp.created_at,
            has_drift: cmp.has_drift(),
            left: &cmp.left,
            right: &cmp.right,
            summary: &cmp.summary,
            report: &cmp.report,
        };

        Ok(serde_json::to_string_pretty(&view)?)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::writers::fixtures;
    use serde_json::{json, Value};

    #[test]
    fn json_output_maps_tables_to_messages() {
        let cmp = fixtures::drifted();
        let output = JsonWriter.format(&cmp).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["has_drift"], json!(true));
        assert_eq!(
            parsed["report"]["orders"],
            json!(["<production> is missing table orders."])
        );
        let users = parsed["report"]["users"].as_array().unwrap();
        assert_eq!(users.len(), 2);
        assert!(users[0].as_str().unwrap().contains("'Type'"));
        assert_eq!(users[1], json!("<production> is missing field email."));
    }

    #[test]
    fn json_output_carries_summary_and_fingerprints() {
        let cmp = fixtures::drifted();
        let parsed: Value = serde_json::from_str(&JsonWriter.format(&cmp).unwrap()).unwrap();

        assert_eq!(parsed["summary"]["tables_compared"], json!(2));
        assert_eq!(parsed["summary"]["missing_tables"], json!(1));
        assert_eq!(parsed["summary"]["missing_fields"], json!(1));
        assert_eq!(parsed["summary"]["attribute_mismatches"], json!(1));
        assert_eq!(parsed["summary"]["total"], json!(3));
        assert_eq!(parsed["left"]["label"], json!("staging"));
        assert_eq!(parsed["left"]["fingerprint"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn clean_comparison_has_empty_report() {
        let parsed: Value =
            serde_json::from_str(&JsonWriter.format(&fixtures::clean()).unwrap()).unwrap();
        assert_eq!(parsed["has_drift"], json!(false));
        assert_eq!(parsed["report"], json!({}));
    }
}
