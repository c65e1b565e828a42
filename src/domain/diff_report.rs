use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::domain::snapshot::Attribute;

/// A single structural difference between two snapshots.
///
/// Labels are carried inline so every discrepancy renders as a self-contained
/// sentence naming the snapshot(s) involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    /// The snapshot labelled `label` has no table `table`.
    MissingTable { label: String, table: String },

    /// The snapshot labelled `label` has the table but not the column `field`.
    MissingField { label: String, field: String },

    /// Both sides have the column but disagree on one attribute.
    AttributeMismatch {
        field: String,
        attribute: Attribute,
        left_label: String,
        left: Option<String>,
        right_label: String,
        right: Option<String>,
    },
}

impl Discrepancy {
    pub fn is_missing_table(&self) -> bool {
        matches!(self, Discrepancy::MissingTable { .. })
    }

    pub fn is_missing_field(&self) -> bool {
        matches!(self, Discrepancy::MissingField { .. })
    }

    pub fn is_attribute_mismatch(&self) -> bool {
        matches!(self, Discrepancy::AttributeMismatch { .. })
    }

    /// The column this discrepancy is about, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Discrepancy::MissingTable { .. } => None,
            Discrepancy::MissingField { field, .. } => Some(field),
            Discrepancy::AttributeMismatch { field, .. } => Some(field),
        }
    }
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::MissingTable { label, table } => {
                write!(f, "{label} is missing table {table}.")
            }
            Discrepancy::MissingField { label, field } => {
                write!(f, "{label} is missing field {field}.")
            }
            Discrepancy::AttributeMismatch {
                field,
                attribute,
                left_label,
                left,
                right_label,
                right,
            } => write!(
                f,
                "Field {field} differs between databases for parameter '{attribute}'. \
                 {left_label} has {} and {right_label} has {}.",
                Quoted(left.as_deref()),
                Quoted(right.as_deref()),
            ),
        }
    }
}

// Serialised as the rendered sentence.
impl Serialize for Discrepancy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// `'value'` for a present value, `NULL` for an absent one.
struct Quoted<'a>(Option<&'a str>);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "'{v}'"),
            None => f.write_str("NULL"),
        }
    }
}

/// Discrepancies grouped by table, in comparison order.
///
/// A table absent from the report is structurally identical on both sides;
/// tables never appear with an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiffReport {
    tables: IndexMap<String, Vec<Discrepancy>>,
}

impl DiffReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the discrepancies found for `table`. Empty lists are dropped.
    pub fn record(&mut self, table: &str, discrepancies: Vec<Discrepancy>) {
        if discrepancies.is_empty() {
            return;
        }
        self.tables
            .entry(table.to_string())
            .or_default()
            .extend(discrepancies);
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of tables with at least one discrepancy.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn get(&self, table: &str) -> Option<&[Discrepancy]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Discrepancy])> {
        self.tables.iter().map(|(t, d)| (t.as_str(), d.as_slice()))
    }

    pub fn discrepancy_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// The rendered messages for one table.
    pub fn messages(&self, table: &str) -> Vec<String> {
        self.get(table)
            .map(|ds| ds.iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    /// The whole report as table name → rendered messages.
    pub fn to_messages(&self) -> IndexMap<String, Vec<String>> {
        self.tables
            .iter()
            .map(|(t, ds)| (t.clone(), ds.iter().map(ToString::to_string).collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attribute_mismatch_message_names_both_sides() {
        let d = Discrepancy::AttributeMismatch {
            field: "id".into(),
            attribute: Attribute::Type,
            left_label: "A".into(),
            left: Some("int(11)".into()),
            right_label: "B".into(),
            right: Some("bigint(20)".into()),
        };
        assert_eq!(
            d.to_string(),
            "Field id differs between databases for parameter 'Type'. \
             A has 'int(11)' and B has 'bigint(20)'."
        );
    }

    #[test]
    fn absent_value_renders_as_null() {
        let d = Discrepancy::AttributeMismatch {
            field: "qty".into(),
            attribute: Attribute::Default,
            left_label: "A".into(),
            left: None,
            right_label: "B".into(),
            right: Some("".into()),
        };
        assert!(d.to_string().ends_with("A has NULL and B has ''."));
    }

    #[test]
    fn empty_lists_are_not_recorded() {
        let mut report = DiffReport::new();
        report.record("users", Vec::new());
        assert!(report.is_empty());
        assert!(!report.contains_table("users"));
    }

    #[test]
    fn serialises_as_table_to_messages() {
        let mut report = DiffReport::new();
        report.record(
            "orders",
            vec![Discrepancy::MissingTable {
                label: "B".into(),
                table: "orders".into(),
            }],
        );
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"orders": ["B is missing table orders."]})
        );
        assert_eq!(report.messages("orders"), ["B is missing table orders."]);
        assert!(report.messages("users").is_empty());
    }
}
