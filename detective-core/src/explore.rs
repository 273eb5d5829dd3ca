//! Exploration tools: source management, listing, ad-hoc queries,
//! sampling and export.
//!
//! These are thin wrappers over the registry and the backend that shape
//! results into the reports callers receive.

use crate::backend::{Query, QueryBackend, SourceRegistry};
use crate::models::{ColumnSchema, DataSource, QueryResult, SourceType, TableEntry, TableRef};
use crate::validation::validate_path;
use crate::{DetectiveError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::path::Path;

/// Row cap appended to ad-hoc queries that carry no `LIMIT` of their own.
pub const DEFAULT_QUERY_LIMIT: usize = 1000;

/// Rows returned by `sample_table` when no count is given.
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Result of connecting a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectReport {
    pub status: String,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub path: String,
    pub tables: Vec<String>,
    pub table_count: usize,
}

impl From<DataSource> for ConnectReport {
    fn from(source: DataSource) -> Self {
        Self {
            status: "connected".to_string(),
            table_count: source.tables.len(),
            name: source.name,
            source_type: source.source_type,
            path: source.path,
            tables: source.tables,
        }
    }
}

/// Result of disconnecting a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectReport {
    pub status: String,
    pub name: String,
}

/// Connected sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceListing {
    pub sources: Vec<DataSource>,
    pub total_sources: usize,
    pub total_tables: usize,
}

/// Tables across every connected source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableListing {
    pub tables: Vec<TableEntry>,
    pub count: usize,
}

/// Columns of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ColumnSchema>,
    pub column_count: usize,
}

/// Rows returned by a query or sample, each as a column-to-value map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, JsonValue>>,
    pub row_count: usize,
}

/// Output file format for `export_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Parquet,
    Csv,
}

impl ExportFormat {
    fn copy_options(&self) -> &'static str {
        match self {
            ExportFormat::Parquet => "(FORMAT PARQUET)",
            ExportFormat::Csv => "(FORMAT CSV, HEADER)",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = DetectiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "parquet" => Ok(ExportFormat::Parquet),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(DetectiveError::invalid_input(
                "format",
                format!("Unsupported format '{other}'. Use 'parquet' or 'csv'."),
            )),
        }
    }
}

/// Result of an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportReport {
    pub status: String,
    pub path: String,
    pub format: ExportFormat,
    pub row_count: u64,
    pub file_size_bytes: u64,
}

/// Connects a source given its type name (`sqlite`, `parquet` or `csv`).
pub fn connect_source(
    registry: &mut SourceRegistry,
    name: &str,
    source_type: &str,
    path: &str,
) -> Result<ConnectReport> {
    let source_type: SourceType = source_type.parse()?;
    Ok(registry.connect(name, source_type, path)?.into())
}

/// Disconnects a registered source.
pub fn disconnect_source(registry: &mut SourceRegistry, name: &str) -> Result<DisconnectReport> {
    let removed = registry.disconnect(name)?;
    Ok(DisconnectReport {
        status: "disconnected".to_string(),
        name: removed.name,
    })
}

/// Lists connected sources.
pub fn list_sources(registry: &SourceRegistry) -> SourceListing {
    let sources: Vec<DataSource> = registry.sources().cloned().collect();
    SourceListing {
        total_sources: sources.len(),
        total_tables: sources
            .iter()
            .map(DataSource::table_count)
            .fold(0, usize::saturating_add),
        sources,
    }
}

/// Lists every table of every connected source.
pub fn list_tables(registry: &SourceRegistry) -> TableListing {
    let tables = registry.list_all_tables();
    TableListing {
        count: tables.len(),
        tables,
    }
}

/// Describes the columns of one table.
pub fn table_schema(backend: &dyn QueryBackend, table: &TableRef) -> Result<TableSchema> {
    let columns = backend.schema(table)?;
    Ok(TableSchema {
        table: table.table().to_string(),
        column_count: columns.len(),
        columns,
    })
}

/// Prepares ad-hoc SQL: trims whitespace and trailing semicolons, and
/// appends `LIMIT <limit>` unless the statement outside its comments
/// already mentions `limit`.
///
/// The check is textual, so a column such as `credit_limit` also counts
/// as a limit.
pub fn apply_limit(sql: &str, limit: usize) -> String {
    let trimmed = trim_statement(sql);
    if strip_comments(trimmed).to_lowercase().contains("limit") {
        trimmed.to_string()
    } else if trimmed.contains("--") {
        // A trailing line comment would swallow the appended clause.
        format!("{trimmed}\nLIMIT {limit}")
    } else {
        format!("{trimmed} LIMIT {limit}")
    }
}

/// Removes `--` line comments and `/* */` block comments, leaving
/// single-quoted literals untouched.
fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    while let Some(c) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix("--") {
            out.push('\n');
            rest = after.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(after) = rest.strip_prefix("/*") {
            out.push(' ');
            rest = after.split_once("*/").map_or("", |(_, tail)| tail);
        } else if let Some(after) = rest.strip_prefix('\'') {
            let (literal, tail) = after.split_once('\'').unwrap_or((after, ""));
            out.push('\'');
            out.push_str(literal);
            out.push('\'');
            rest = tail;
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    out
}

fn trim_statement(sql: &str) -> &str {
    sql.trim().trim_end_matches(';').trim_end()
}

/// Runs ad-hoc SQL with a row cap.
///
/// # Errors
/// Returns `DetectiveError::Backend` with DuckDB's message if the statement fails.
pub fn run_query(backend: &dyn QueryBackend, sql: &str, limit: usize) -> Result<RowSet> {
    let sql = apply_limit(sql, limit);
    tracing::debug!(sql = %sql, "Running ad-hoc query");
    let result = backend.execute(&sql)?;
    Ok(row_set(None, result))
}

/// Returns a random sample of `n` rows from a table.
pub fn sample_table(backend: &dyn QueryBackend, table: &TableRef, n: usize) -> Result<RowSet> {
    let result = backend.run(&Query::Sample {
        relation: backend.resolve(table),
        rows: n,
    })?;
    Ok(row_set(Some(table.table().to_string()), result))
}

fn row_set(table: Option<String>, result: QueryResult) -> RowSet {
    let row_count = result.row_count();
    let columns = result.columns.clone();
    RowSet {
        table,
        columns,
        row_count,
        rows: result.into_records(),
    }
}

/// Writes the result of a query to a Parquet or CSV file.
///
/// The format is checked first, then the path. Parent directories are
/// created as needed.
///
/// # Errors
/// - `InvalidInput` for an unknown format or an unsafe path
/// - `Io` if the output directory cannot be created or the file inspected
/// - `Backend` if the query or the copy fails
pub fn export_data(
    backend: &dyn QueryBackend,
    sql: &str,
    output_path: &str,
    format: &str,
) -> Result<ExportReport> {
    let format: ExportFormat = format.parse()?;
    let resolved = std::path::absolute(output_path)
        .map_err(|e| DetectiveError::io(format!("Failed to resolve path '{output_path}'"), e))?
        .to_string_lossy()
        .into_owned();
    let resolved = validate_path(&resolved, "output path")?;

    if let Some(parent) = Path::new(&resolved).parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            DetectiveError::io(format!("Failed to create directory {}", parent.display()), e)
        })?;
    }

    let statement = trim_statement(sql);
    backend.execute(&format!(
        "COPY ({statement}) TO '{resolved}' {}",
        format.copy_options()
    ))?;

    let row_count = backend
        .scalar(&format!("SELECT COUNT(*) FROM ({statement})"))
        .map(|v| crate::backend::values::as_u64(&v).unwrap_or(0))?;
    let file_size_bytes = std::fs::metadata(&resolved)
        .map_err(|e| DetectiveError::io(format!("Failed to inspect {resolved}"), e))?
        .len();

    tracing::info!(path = %resolved, row_count, file_size_bytes, "Exported query result");
    Ok(ExportReport {
        status: "exported".to_string(),
        path: resolved,
        format,
        row_count,
        file_size_bytes,
    })
}
