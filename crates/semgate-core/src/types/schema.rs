//! Schema collaborator types
//!
//! Schema discovery runs outside the engine; these types are the seam it
//! hands data across. Detectors consume a `SchemaSnapshot` (plus optional
//! sample rows) to produce candidate rules.

use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A discovered database schema
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

/// A table with its columns and foreign-key metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub name: String,

    #[serde(default)]
    pub columns: Vec<ColumnSchema>,

    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,

    /// Optional sample rows supplied by discovery for heuristic detectors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_rows: Vec<HashMap<String, Value>>,
}

/// A single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    pub name: String,

    pub data_type: String,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub primary_key: bool,
}

/// Foreign-key edge from one column to another table's column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
}

impl SchemaSnapshot {
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn find_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }
}
