//! Core data models shared by the registry, the query backend and the tools.
//!
//! Everything here is plain data: sources, table references, column
//! schemas and tabular query results. All models serialise directly into
//! the JSON shapes the tools report.

use crate::validation::{validate_identifier, validate_optional_identifier};
use crate::{DetectiveError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Declared-type fragments that mark a column as numeric.
///
/// Backend type names are open-ended, so numeric-ness is a substring
/// match against this set rather than a closed type check.
pub const NUMERIC_TYPE_FRAGMENTS: &[&str] = &[
    "int", "float", "double", "decimal", "numeric", "bigint", "smallint", "tinyint", "hugeint",
    "ubigint", "real",
];

/// Returns true when a declared column type looks numeric.
///
/// Case-insensitive substring containment against
/// [`NUMERIC_TYPE_FRAGMENTS`]; `DECIMAL(10,2)` and `UINTEGER` both match.
pub fn is_numeric_type(declared: &str) -> bool {
    let lowered = declared.to_lowercase();
    NUMERIC_TYPE_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
}

/// Supported data source kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Sqlite,
    Parquet,
    Csv,
}

impl SourceType {
    /// Lowercase name as used in tool arguments and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Sqlite => "sqlite",
            SourceType::Parquet => "parquet",
            SourceType::Csv => "csv",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = DetectiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(SourceType::Sqlite),
            "parquet" => Ok(SourceType::Parquet),
            "csv" => Ok(SourceType::Csv),
            other => Err(DetectiveError::invalid_input(
                "source type",
                format!("'{other}' is not supported. Use 'sqlite', 'parquet', or 'csv'."),
            )),
        }
    }
}

/// A registered data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// Absolute path (may contain a glob for parquet/csv)
    pub path: String,
    /// Tables or views the source exposes, sorted by name
    pub tables: Vec<String>,
}

impl DataSource {
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

/// One table exposed by a registered source, as listed by `list_tables`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub source: String,
    pub table: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub path: String,
}

/// A validated reference to a queryable table, optionally qualified by a source alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    table: String,
    source: Option<String>,
}

impl TableRef {
    /// Validates both names and builds a reference.
    ///
    /// # Errors
    /// Returns `DetectiveError::InvalidInput` if either name fails
    /// identifier validation.
    pub fn new(table: &str, source: Option<&str>) -> Result<Self> {
        Ok(Self {
            table: validate_identifier(table, "table")?,
            source: validate_optional_identifier(source, "source")?,
        })
    }

    /// Builds a reference from names discovered in the backend's own catalog.
    pub(crate) fn from_catalog(table: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            source: Some(source.into()),
        }
    }

    /// Table name as given.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Source alias, if the reference is qualified.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{source}.{}", self.table),
            None => f.write_str(&self.table),
        }
    }
}

/// The quoted SQL name a [`TableRef`] resolves to, ready for a `FROM` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation(String);

impl Relation {
    /// A bare relation: `"table"`.
    pub fn bare(table: &str) -> Self {
        Self(crate::backend::quote_ident(table))
    }

    /// A catalog-qualified relation: `"source"."table"`.
    pub fn qualified(source: &str, table: &str) -> Self {
        Self(format!(
            "{}.{}",
            crate::backend::quote_ident(source),
            crate::backend::quote_ident(table)
        ))
    }

    /// SQL text of the quoted relation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One column of a table schema, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub column: String,
    /// Declared type as reported by the backend (free-form)
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
}

impl ColumnSchema {
    /// Builds a column description from name, declared type and nullability.
    pub fn new(column: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            column: column.into(),
            data_type: data_type.into(),
            nullable,
        }
    }

    /// Whether the declared type is numeric, see [`is_numeric_type`].
    pub fn is_numeric(&self) -> bool {
        is_numeric_type(&self.data_type)
    }
}

/// Tabular result of a query: column names plus rows of JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl QueryResult {
    /// Number of rows returned.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// First cell of the first row, if any.
    pub fn first_value(&self) -> Option<&JsonValue> {
        self.rows.first().and_then(|row| row.first())
    }

    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Converts each row into a column-name to value map.
    pub fn into_records(self) -> Vec<Map<String, JsonValue>> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect()
    }
}
