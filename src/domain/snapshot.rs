use anyhow::{ensure, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Columns of one table, keyed by column name, in introspection order.
pub type TableSchema = IndexMap<String, ColumnSchema>;

/// The exported representation of one database's schema.
///
/// `label` and `captured_at` are informational: they appear in diff messages
/// and report headers but never take part in the comparison itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub label: String,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub tables: IndexMap<String, TableSchema>,
}

impl Snapshot {
    /// Build a snapshot stamped with the current time.
    pub fn new(label: impl Into<String>, tables: IndexMap<String, TableSchema>) -> Self {
        Self::captured(label, Utc::now(), tables)
    }

    pub fn captured(
        label: impl Into<String>,
        captured_at: DateTime<Utc>,
        tables: IndexMap<String, TableSchema>,
    ) -> Self {
        Self {
            label: label.into(),
            captured_at,
            tables,
        }
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.len()).sum()
    }

    /// Check that every column's `Field` attribute matches the key it is stored under.
    pub fn validate(&self) -> Result<()> {
        for (table, columns) in &self.tables {
            for (name, column) in columns {
                ensure!(
                    column.field == *name,
                    "snapshot '{}': column '{}' of table '{}' carries Field '{}'",
                    self.label,
                    name,
                    table,
                    column.field
                );
            }
        }
        Ok(())
    }
}

/// One column, as reported by a column-introspection query.
///
/// Serialised with the introspection attribute names (`Field`, `Type`, …).
/// A missing attribute decodes to its unset value: `""`, or `None` for `Default`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    #[serde(rename = "Field", default, deserialize_with = "lenient::text")]
    pub field: String,
    #[serde(rename = "Type", default, deserialize_with = "lenient::text")]
    pub r#type: String,
    #[serde(rename = "Null", default, deserialize_with = "lenient::text")]
    pub null: String,
    #[serde(rename = "Key", default, deserialize_with = "lenient::text")]
    pub key: String,
    #[serde(rename = "Default", default, deserialize_with = "lenient::optional_text")]
    pub default: Option<String>,
    #[serde(rename = "Extra", default, deserialize_with = "lenient::text")]
    pub extra: String,
}

impl ColumnSchema {
    pub fn new(field: impl Into<String>, r#type: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            r#type: r#type.into(),
            null: "YES".to_string(),
            ..Self::default()
        }
    }

    pub fn not_null(mut self) -> Self {
        self.null = "NO".to_string();
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Look up one attribute. Only `Default` can be absent.
    pub fn attribute(&self, attr: Attribute) -> Option<&str> {
        match attr {
            Attribute::Field => Some(&self.field),
            Attribute::Type => Some(&self.r#type),
            Attribute::Null => Some(&self.null),
            Attribute::Key => Some(&self.key),
            Attribute::Default => self.default.as_deref(),
            Attribute::Extra => Some(&self.extra),
        }
    }
}

/// The recognised column attributes, in comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Field,
    Type,
    Null,
    Key,
    Default,
    Extra,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Field,
        Attribute::Type,
        Attribute::Null,
        Attribute::Key,
        Attribute::Default,
        Attribute::Extra,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Attribute::Field => "Field",
            Attribute::Type => "Type",
            Attribute::Null => "Null",
            Attribute::Key => "Key",
            Attribute::Default => "Default",
            Attribute::Extra => "Extra",
        }
    }

    /// Attributes whose values are compared by numeric value when both sides parse as numbers.
    pub fn is_numeric(self) -> bool {
        matches!(self, Attribute::Default)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts strings, numbers, booleans and null for attribute values.
mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Signed(i64),
        Unsigned(u64),
        Float(f64),
        Flag(bool),
    }

    impl Raw {
        fn into_text(self) -> String {
            match self {
                Raw::Text(s) => s,
                Raw::Signed(n) => n.to_string(),
                Raw::Unsigned(n) => n.to_string(),
                Raw::Float(n) => n.to_string(),
                Raw::Flag(b) => b.to_string(),
            }
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(optional_text(d)?.unwrap_or_default())
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Raw>::deserialize(d)?.map(Raw::into_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_uses_introspection_attribute_names() {
        let col = ColumnSchema::new("id", "int(11)")
            .not_null()
            .key("PRI")
            .extra("auto_increment");
        let v = serde_json::to_value(&col).unwrap();
        assert_eq!(
            v,
            json!({
                "Field": "id",
                "Type": "int(11)",
                "Null": "NO",
                "Key": "PRI",
                "Default": null,
                "Extra": "auto_increment"
            })
        );
    }

    #[test]
    fn missing_attributes_decode_as_unset() {
        let col: ColumnSchema = serde_json::from_value(json!({"Field": "email"})).unwrap();
        assert_eq!(col.field, "email");
        assert_eq!(col.r#type, "");
        assert_eq!(col.key, "");
        assert_eq!(col.default, None);
        assert_eq!(col.attribute(Attribute::Default), None);
        assert_eq!(col.attribute(Attribute::Extra), Some(""));
    }

    #[test]
    fn non_string_attribute_values_are_kept_as_text() {
        let col: ColumnSchema =
            serde_json::from_value(json!({"Field": "qty", "Default": 0, "Null": null})).unwrap();
        assert_eq!(col.default.as_deref(), Some("0"));
        assert_eq!(col.null, "");
    }

    #[test]
    fn snapshot_preserves_table_and_column_order() {
        let raw = r#"{
            "label": "staging",
            "captured_at": "2024-05-01T10:00:00Z",
            "tables": {
                "zebra": {"b": {"Field": "b"}, "a": {"Field": "a"}},
                "apple": {}
            }
        }"#;
        let snap: Snapshot = serde_json::from_str(raw).unwrap();
        let tables: Vec<_> = snap.tables.keys().cloned().collect();
        assert_eq!(tables, ["zebra", "apple"]);
        let cols: Vec<_> = snap.tables["zebra"].keys().cloned().collect();
        assert_eq!(cols, ["b", "a"]);
        assert_eq!(snap.column_count(), 2);
    }

    #[test]
    fn validate_rejects_field_key_mismatch() {
        let mut users = TableSchema::new();
        users.insert("id".into(), ColumnSchema::new("user_id", "int"));
        let snap = Snapshot::new("prod", [("users".to_string(), users)].into_iter().collect());
        let err = snap.validate().unwrap_err().to_string();
        assert!(err.contains("user_id"), "got: {err}");
    }

    #[test]
    fn validate_accepts_consistent_snapshot() {
        let mut users = TableSchema::new();
        users.insert("id".into(), ColumnSchema::new("id", "int"));
        let snap = Snapshot::new("prod", [("users".to_string(), users)].into_iter().collect());
        assert!(snap.validate().is_ok());
    }
}
