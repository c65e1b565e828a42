use anyhow::Result;
use std::fmt::Write as FmtWrite;

use crate::domain::{comparison::Comparison, ports::OutputWriter};

/// Plain-text report: a header, then one block per differing table with one
/// line per discrepancy.
pub struct TextWriter;

impl OutputWriter for TextWriter {
    fn format(&self, cmp: &Comparison) -> Result<String> {
        let mut s = String::new();

        writeln!(s, "Schema comparison {}", cmp.report_id)?;
        for side in [&cmp.left, &cmp.right] {
            writeln!(
                s,
                "  {}: {} tables, {} columns, captured {}, fingerprint {}",
                side.label,
                side.tables,
                side.columns,
                side.captured_at.to_rfc3339(),
                side.fingerprint.short()
            )?;
        }
        writeln!(s)?;

        if !cmp.has_drift() {
            writeln!(s, "No structural differences.")?;
            return Ok(s);
        }

        for (table, discrepancies) in cmp.report.iter() {
            writeln!(s, "{table}")?;
            for d in discrepancies {
                writeln!(s, "  - {d}")?;
            }
            writeln!(s)?;
        }

        let sum = &cmp.summary;
        writeln!(
            s,
            "{} discrepancies in {} of {} tables ({} missing tables, {} missing fields, {} attribute mismatches).",
            sum.total,
            sum.tables_differing,
            sum.tables_compared,
            sum.missing_tables,
            sum.missing_fields,
            sum.attribute_mismatches
        )?;

        Ok(s)
    }

    fn extension(&self) -> &'static str {
        "txt"
    }
}
