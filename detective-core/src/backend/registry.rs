//! DuckDB-backed source registry.
//!
//! All sources are reached through one in-memory DuckDB connection, which
//! reads SQLite databases, Parquet files and CSV files natively. That gives
//! a single SQL dialect across every source type.
//!
//! # Catalog objects
//! - SQLite: attached read-only as a catalog named after the source alias;
//!   its tables are addressed as `"alias"."table"`.
//! - Parquet / CSV: a view named after the alias over `read_parquet` /
//!   `read_csv_auto`; the view is the source's only table.
//!
//! Connect and disconnect create and tear down exactly these objects.

use super::{QueryBackend, values};
use crate::models::{DataSource, QueryResult, Relation, SourceType, TableEntry, TableRef};
use crate::validation::{validate_identifier, validate_path};
use crate::{DetectiveError, Result};
use duckdb::Connection;
use duckdb::types::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Registry of connected data sources sharing one DuckDB connection.
///
/// Not thread-safe for concurrent statements; callers serialize access.
pub struct SourceRegistry {
    conn: Connection,
    sources: BTreeMap<String, DataSource>,
    sqlite_loaded: bool,
}

impl SourceRegistry {
    /// Opens an empty registry over a fresh in-memory DuckDB database.
    ///
    /// # Errors
    /// Returns `DetectiveError::Backend` if DuckDB cannot be initialized.
    pub fn new() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DetectiveError::backend("Failed to open in-memory DuckDB", e))?;
        Ok(Self {
            conn,
            sources: BTreeMap::new(),
            sqlite_loaded: false,
        })
    }

    /// The underlying connection, e.g. for creating scratch tables.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Registered sources in alias order.
    pub fn sources(&self) -> impl Iterator<Item = &DataSource> {
        self.sources.values()
    }

    /// Looks up a registered source by alias.
    pub fn source(&self, name: &str) -> Option<&DataSource> {
        self.sources.get(name)
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Registers and connects a new data source.
    ///
    /// # Arguments
    /// * `name` - Alias for the source; also the catalog or view name
    /// * `source_type` - Kind of source behind `path`
    /// * `path` - File path; parquet and csv paths may be globs such as `./data/*.parquet`
    ///
    /// # Errors
    /// - `InvalidInput` if the name or resolved path fails validation
    /// - `SourceExists` if the alias is already registered
    /// - `PathNotFound` if a non-glob path does not exist
    /// - `Backend` if DuckDB cannot attach or read the source
    ///
    /// Catalog objects created before a failure are removed again before
    /// the error is returned.
    pub fn connect(&mut self, name: &str, source_type: SourceType, path: &str) -> Result<DataSource> {
        let name = validate_identifier(name, "source name")?;
        if self.source(&name).is_some() {
            return Err(DetectiveError::SourceExists { name });
        }

        let resolved = std::path::absolute(path)
            .map_err(|e| DetectiveError::io(format!("Failed to resolve path '{path}'"), e))?
            .to_string_lossy()
            .into_owned();
        let resolved = validate_path(&resolved, "source path")?;

        if !resolved.contains('*') && !Path::new(&resolved).exists() {
            return Err(DetectiveError::PathNotFound { path: resolved });
        }

        if source_type == SourceType::Sqlite {
            self.ensure_sqlite_extension()?;
        }

        self.create_catalog_object(&name, source_type, &resolved)?;

        let tables = match self.discover_tables(&name, source_type) {
            Ok(tables) => tables,
            Err(e) => {
                if let Err(cleanup) = self.teardown(&name, source_type) {
                    tracing::warn!(source = %name, error = %cleanup, "Cleanup after failed connect did not complete");
                }
                return Err(e);
            }
        };

        let source = DataSource {
            name: name.clone(),
            source_type,
            path: resolved,
            tables,
        };
        tracing::info!(
            source = %source.name,
            source_type = %source.source_type,
            tables = source.table_count(),
            "Connected source"
        );
        self.sources.insert(name, source.clone());
        Ok(source)
    }

    /// Tears down a registered source and forgets it.
    ///
    /// Teardown statements are idempotent. If teardown fails the source
    /// stays registered so the call can be retried.
    ///
    /// # Errors
    /// - `InvalidInput` if the name fails validation
    /// - `UnknownSource` if no source has this alias
    /// - `Backend` if the catalog object could not be removed
    pub fn disconnect(&mut self, name: &str) -> Result<DataSource> {
        let name = validate_identifier(name, "source name")?;
        let source_type = self
            .sources
            .get(&name)
            .map(|s| s.source_type)
            .ok_or_else(|| DetectiveError::UnknownSource { name: name.clone() })?;

        self.teardown(&name, source_type)?;

        let removed = self
            .sources
            .remove(&name)
            .ok_or(DetectiveError::UnknownSource { name })?;
        tracing::info!(source = %removed.name, "Disconnected source");
        Ok(removed)
    }

    /// Every table of every registered source.
    pub fn list_all_tables(&self) -> Vec<TableEntry> {
        self.sources
            .values()
            .flat_map(|source| {
                source.tables.iter().map(|table| TableEntry {
                    source: source.name.clone(),
                    table: table.clone(),
                    source_type: source.source_type,
                    path: source.path.clone(),
                })
            })
            .collect()
    }

    /// Reference to a table of a registered source, bypassing validation
    /// for names that came from the source's own catalog.
    pub(crate) fn catalog_table(&self, source: &DataSource, table: &str) -> TableRef {
        TableRef::from_catalog(table, source.name.clone())
    }

    fn ensure_sqlite_extension(&mut self) -> Result<()> {
        if self.sqlite_loaded {
            return Ok(());
        }
        self.conn
            .execute_batch("INSTALL sqlite; LOAD sqlite;")
            .map_err(|e| DetectiveError::backend("Failed to load the DuckDB sqlite extension", e))?;
        self.sqlite_loaded = true;
        Ok(())
    }

    fn create_catalog_object(&self, name: &str, source_type: SourceType, path: &str) -> Result<()> {
        let quoted = super::quote_ident(name);
        let sql = match source_type {
            SourceType::Sqlite => format!("ATTACH '{path}' AS {quoted} (TYPE sqlite, READ_ONLY)"),
            SourceType::Parquet => {
                format!("CREATE OR REPLACE VIEW {quoted} AS SELECT * FROM read_parquet('{path}')")
            }
            SourceType::Csv => {
                format!("CREATE OR REPLACE VIEW {quoted} AS SELECT * FROM read_csv_auto('{path}')")
            }
        };
        tracing::debug!(sql = %sql, "Creating catalog object");
        self.conn.execute_batch(&sql).map_err(|e| {
            DetectiveError::backend(format!("Failed to connect {source_type} source '{name}'"), e)
        })
    }

    fn discover_tables(&self, name: &str, source_type: SourceType) -> Result<Vec<String>> {
        if source_type != SourceType::Sqlite {
            return Ok(vec![name.to_string()]);
        }

        let context = || format!("Failed to list tables of source '{name}'");
        let mut stmt = self
            .conn
            .prepare(
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_catalog = ? ORDER BY table_name",
            )
            .map_err(|e| DetectiveError::backend(context(), e))?;
        let tables = stmt
            .query_map([name], |row| row.get::<_, String>(0))
            .map_err(|e| DetectiveError::backend(context(), e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DetectiveError::backend(context(), e))?;
        Ok(tables)
    }

    fn teardown(&self, name: &str, source_type: SourceType) -> Result<()> {
        let quoted = super::quote_ident(name);
        let sql = match source_type {
            SourceType::Sqlite => format!("DETACH DATABASE IF EXISTS {quoted}"),
            SourceType::Parquet | SourceType::Csv => format!("DROP VIEW IF EXISTS {quoted}"),
        };
        self.conn
            .execute_batch(&sql)
            .map_err(|e| DetectiveError::backend(format!("Failed to disconnect source '{name}'"), e))
    }
}

impl QueryBackend for SourceRegistry {
    fn execute(&self, sql: &str) -> Result<QueryResult> {
        execute_on(&self.conn, sql)
    }

    /// SQLite sources qualify by catalog, file sources are bare views, and
    /// unknown aliases are passed through as qualifiers for DuckDB to judge.
    fn resolve(&self, table: &TableRef) -> Relation {
        match table.source() {
            Some(alias) => match self.source(alias) {
                Some(source) if source.source_type != SourceType::Sqlite => {
                    Relation::bare(table.table())
                }
                _ => Relation::qualified(alias, table.table()),
            },
            None => Relation::bare(table.table()),
        }
    }
}

/// Runs one statement and collects every row as JSON values.
fn execute_on(conn: &Connection, sql: &str) -> Result<QueryResult> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| DetectiveError::backend("Query failed", e))?;
    let mut rows = stmt
        .query([])
        .map_err(|e| DetectiveError::backend("Query failed", e))?;
    let columns = rows
        .as_ref()
        .map(|s| s.column_names())
        .unwrap_or_default();

    let mut collected = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| DetectiveError::backend("Failed to read query results", e))?
    {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            let value: Value = row
                .get(idx)
                .map_err(|e| DetectiveError::backend("Failed to read query results", e))?;
            values.push(values::to_json(value));
        }
        collected.push(values);
    }

    Ok(QueryResult {
        columns,
        rows: collected,
    })
}
