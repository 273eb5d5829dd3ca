//! Query backend abstraction.
//!
//! The analysis tools talk to a [`QueryBackend`]: something that executes
//! read-only SQL, resolves table references to quoted relations and
//! describes their columns. [`SourceRegistry`] is the DuckDB-backed
//! implementation.

mod query;
mod registry;
pub mod values;

pub use query::{Predicate, Query, Z_SCORE_COLUMN, quote_ident};
pub use registry::SourceRegistry;

use crate::models::{ColumnSchema, QueryResult, Relation, TableRef};
use crate::{DetectiveError, Result};
use serde_json::Value as JsonValue;

/// Synchronous SQL execution over a single connection.
pub trait QueryBackend {
    /// Executes a statement and returns all result rows.
    ///
    /// # Errors
    /// Returns `DetectiveError::Backend` with the engine's native error.
    fn execute(&self, sql: &str) -> Result<QueryResult>;

    /// Resolves a table reference to the relation name used in `FROM`.
    fn resolve(&self, table: &TableRef) -> Relation;

    /// Executes a statement and returns its first cell, or null if there are no rows.
    fn scalar(&self, sql: &str) -> Result<JsonValue> {
        Ok(self
            .execute(sql)?
            .first_value()
            .cloned()
            .unwrap_or(JsonValue::Null))
    }

    /// Columns of a table in declaration order.
    fn schema(&self, table: &TableRef) -> Result<Vec<ColumnSchema>> {
        let described = self.run(&Query::Describe {
            relation: self.resolve(table),
        })?;
        describe_to_schema(described)
    }

    /// Executes a typed query.
    fn run(&self, query: &Query) -> Result<QueryResult> {
        let sql = query.to_sql();
        tracing::debug!(kind = query.kind(), sql = %sql, "Running query");
        self.execute(&sql)
    }

    /// Executes a typed query whose single cell is a count.
    ///
    /// A null result reads as zero.
    fn count(&self, query: &Query) -> Result<u64> {
        let result = self.run(query)?;
        Ok(result.first_value().and_then(values::as_u64).unwrap_or(0))
    }
}

/// Maps a `DESCRIBE` result onto column schemas.
fn describe_to_schema(described: QueryResult) -> Result<Vec<ColumnSchema>> {
    let position = |name: &str| {
        described.column_index(name).ok_or_else(|| {
            DetectiveError::configuration(format!("DESCRIBE result is missing '{name}'"))
        })
    };
    let name_idx = position("column_name")?;
    let type_idx = position("column_type")?;
    let null_idx = position("null")?;

    Ok(described
        .rows
        .iter()
        .map(|row| {
            let text = |idx: usize| {
                row.get(idx)
                    .and_then(JsonValue::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            ColumnSchema::new(text(name_idx), text(type_idx), text(null_idx) == "YES")
        })
        .collect())
}
