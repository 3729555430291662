//! Table schemas consumed by model and controller generation.
//!
//! The generator never queries a database itself. A [`SchemaSource`] answers catalog questions;
//! the shipped implementation reads a snapshot of the catalog exported to YAML or JSON:
//!
//! ```yaml
//! connections:
//!   default:
//!     shop:
//!       - name: orders
//!         comment: Customer orders
//!         columns:
//!           - { name: id, type: bigint, comment: "" }
//!           - { name: status, type: varchar, comment: Order status }
//! ```

use crate::error::{Error, Result};
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: ColumnType,
    pub comment: String,
}

/// Column type category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// Character and date types
    Text,
    /// Small integers used as flags
    Integer,
    /// Passed through lowercased
    Other(String),
}

/// Maps a raw catalog data type to its category.
pub fn map_column_type(raw: &str) -> ColumnType {
    let raw = raw.trim().to_ascii_lowercase();
    match raw.as_str() {
        "varchar" | "char" | "tinytext" | "datetime" | "text" | "longtext" | "timestamp" => {
            ColumnType::Text
        }
        "tinyint" => ColumnType::Integer,
        _ => ColumnType::Other(raw),
    }
}

/// Catalog queries needed to generate models and controllers.
///
/// Every method fails with [`Error::SchemaSource`]; callers log it and stop the dependent step.
pub trait SchemaSource {
    /// Base tables of a schema, in catalog order.
    fn tables(&self, connection: &str, schema: &str) -> Result<Vec<TableInfo>>;

    /// One table, or `None` when it does not exist.
    fn table(&self, connection: &str, schema: &str, name: &str) -> Result<Option<TableInfo>>;

    /// Columns of a table in ordinal order.
    fn columns(&self, connection: &str, schema: &str, table: &str) -> Result<Vec<ColumnInfo>>;
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    connections: BTreeMap<String, BTreeMap<String, Vec<SnapshotTable>>>,
}

#[derive(Debug, Deserialize)]
struct SnapshotTable {
    name: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    columns: Vec<SnapshotColumn>,
}

#[derive(Debug, Deserialize)]
struct SnapshotColumn {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
    #[serde(default)]
    comment: String,
}

/// Schema source backed by a catalog snapshot file.
#[derive(Debug)]
pub struct SnapshotSchemaSource {
    snapshot: Snapshot,
}

impl SnapshotSchemaSource {
    /// Loads a snapshot; `.json` files are read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::SchemaSource(format!("cannot read {}: {}", path.display(), e))
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed: std::result::Result<Snapshot, String> = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        let snapshot = parsed.map_err(|e| {
            Error::SchemaSource(format!("invalid snapshot {}: {}", path.display(), e))
        })?;

        debug!("Loaded schema snapshot {}", path.display());
        Ok(Self { snapshot })
    }

    /// Parses a YAML snapshot held in memory.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let snapshot = serde_yaml::from_str(content)
            .map_err(|e| Error::SchemaSource(format!("invalid snapshot: {}", e)))?;
        Ok(Self { snapshot })
    }

    fn schema(&self, connection: &str, schema: &str) -> Result<&[SnapshotTable]> {
        let schemas = self
            .snapshot
            .connections
            .get(connection)
            .ok_or_else(|| Error::SchemaSource(format!("unknown connection {}", connection)))?;
        schemas
            .get(schema)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::SchemaSource(format!("unknown schema {}.{}", connection, schema)))
    }
}

impl SchemaSource for SnapshotSchemaSource {
    fn tables(&self, connection: &str, schema: &str) -> Result<Vec<TableInfo>> {
        Ok(self
            .schema(connection, schema)?
            .iter()
            .map(|t| TableInfo {
                name: t.name.clone(),
                comment: t.comment.clone(),
            })
            .collect())
    }

    fn table(&self, connection: &str, schema: &str, name: &str) -> Result<Option<TableInfo>> {
        Ok(self
            .schema(connection, schema)?
            .iter()
            .find(|t| t.name == name)
            .map(|t| TableInfo {
                name: t.name.clone(),
                comment: t.comment.clone(),
            }))
    }

    fn columns(&self, connection: &str, schema: &str, table: &str) -> Result<Vec<ColumnInfo>> {
        let table = self
            .schema(connection, schema)?
            .iter()
            .find(|t| t.name == table)
            .ok_or_else(|| Error::SchemaSource(format!("unknown table {}.{}", schema, table)))?;
        Ok(table
            .columns
            .iter()
            .map(|c| ColumnInfo {
                name: c.name.clone(),
                data_type: map_column_type(&c.data_type),
                comment: c.comment.clone(),
            })
            .collect())
    }
}
