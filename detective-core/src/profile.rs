//! Table profiling and catalog summaries.
//!
//! A profile reports per-column descriptive statistics: null and distinct
//! counts for every column, numeric aggregates for numeric columns, and a
//! value histogram for low-cardinality columns.

use crate::Result;
use crate::backend::values::{as_f64, as_u64, display_value};
use crate::backend::{Predicate, Query, QueryBackend, SourceRegistry};
use crate::models::{ColumnSchema, Relation, SourceType, TableRef};
use serde::{Deserialize, Serialize};

/// Profiling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Histograms are built only for columns with at most this many distinct values
    pub histogram_max_distinct: u64,
    /// Maximum number of histogram entries
    pub top_values_limit: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            histogram_max_distinct: 20,
            top_values_limit: 10,
        }
    }
}

impl ProfileConfig {
    /// Creates a new profile config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the histogram cardinality cutoff.
    pub fn with_histogram_max_distinct(mut self, max_distinct: u64) -> Self {
        self.histogram_max_distinct = max_distinct;
        self
    }

    /// Builder method to set the number of histogram entries.
    pub fn with_top_values_limit(mut self, limit: usize) -> Self {
        if limit == 0 {
            tracing::warn!("top_values_limit 0 clamped to 1");
        }
        self.top_values_limit = limit.max(1);
        self
    }
}

/// Aggregates of a numeric column; null when the column has no values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation
    pub stddev: Option<f64>,
}

/// One histogram entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopValue {
    /// Value rendered as text; null values appear as `"null"`
    pub value: String,
    pub count: u64,
}

/// Statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub column: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub null_count: u64,
    /// null_count / row_count, 0 for an empty table
    pub null_rate: f64,
    pub distinct_count: u64,
    /// distinct_count / row_count, 0 for an empty table
    pub unique_rate: f64,
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_values: Option<Vec<TopValue>>,
}

/// Profile of a whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    pub table: String,
    pub row_count: u64,
    pub column_count: usize,
    pub columns: Vec<ColumnProfile>,
}

/// Ratio of `count` to `total`, defined as 0 when `total` is 0.
pub fn rate(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Computes column profiles.
#[derive(Debug, Clone, Default)]
pub struct Profiler {
    config: ProfileConfig,
}

impl Profiler {
    /// Creates a new profiler with the given configuration.
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }

    /// Creates a new profiler with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ProfileConfig::default())
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Profiles every column of a table in schema order.
    ///
    /// # Errors
    /// Returns `DetectiveError::Backend` if the table cannot be resolved or
    /// an aggregate query fails.
    pub fn profile(&self, backend: &dyn QueryBackend, table: &TableRef) -> Result<TableProfile> {
        let relation = backend.resolve(table);
        let row_count = backend.count(&Query::count(&relation))?;
        let schema = backend.schema(table)?;

        let columns = schema
            .iter()
            .map(|column| self.profile_column(backend, &relation, column, row_count))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(table = %table, row_count, columns = columns.len(), "Profiled table");
        Ok(TableProfile {
            table: table.table().to_string(),
            row_count,
            column_count: schema.len(),
            columns,
        })
    }

    fn profile_column(
        &self,
        backend: &dyn QueryBackend,
        relation: &Relation,
        column: &ColumnSchema,
        row_count: u64,
    ) -> Result<ColumnProfile> {
        let name = column.column.as_str();
        let null_count = backend.count(&Query::count_where(
            relation,
            Predicate::IsNull(name.to_string()),
        ))?;
        let distinct_count = backend.count(&Query::distinct_count(relation, name))?;

        let numeric = if column.is_numeric() {
            let summary = backend.run(&Query::NumericSummary {
                relation: relation.clone(),
                column: name.to_string(),
            })?;
            let cell = |idx: usize| {
                summary
                    .rows
                    .first()
                    .and_then(|row| row.get(idx))
                    .and_then(as_f64)
            };
            Some(NumericSummary {
                min: cell(0),
                max: cell(1),
                mean: cell(2),
                median: cell(3),
                stddev: cell(4),
            })
        } else {
            None
        };

        let top_values = if distinct_count <= self.config.histogram_max_distinct && row_count > 0 {
            let histogram = backend.run(&Query::ValueHistogram {
                relation: relation.clone(),
                column: name.to_string(),
                limit: self.config.top_values_limit,
            })?;
            Some(
                histogram
                    .rows
                    .iter()
                    .map(|row| TopValue {
                        value: row.first().map(display_value).unwrap_or_else(|| "null".to_string()),
                        count: row.get(1).and_then(as_u64).unwrap_or(0),
                    })
                    .collect(),
            )
        } else {
            None
        };

        Ok(ColumnProfile {
            column: name.to_string(),
            data_type: column.data_type.clone(),
            null_count,
            null_rate: rate(null_count, row_count),
            distinct_count,
            unique_rate: rate(distinct_count, row_count),
            numeric,
            top_values,
        })
    }
}

/// Summary of one table within a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    /// -1 when the table could not be counted
    pub row_count: i64,
    pub column_count: usize,
    pub columns: Vec<String>,
}

/// Summary of one connected source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub tables: Vec<TableSummary>,
}

/// Summary of everything connected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub total_sources: usize,
    pub total_tables: usize,
    /// Sum of the row counts that could be determined
    pub total_rows: u64,
    pub sources: Vec<SourceSummary>,
}

/// Summarizes every table of every connected source.
///
/// A table whose count fails is recorded with `row_count = -1`, and one
/// whose schema cannot be read is recorded without columns; neither aborts
/// the summary.
pub fn summarize(registry: &SourceRegistry) -> CatalogSummary {
    let mut total_rows: u64 = 0;
    let sources: Vec<SourceSummary> = registry
        .sources()
        .map(|source| {
            let tables = source
                .tables
                .iter()
                .map(|name| {
                    let table = registry.catalog_table(source, name);
                    let relation = registry.resolve(&table);
                    let row_count = match registry.count(&Query::count(&relation)) {
                        Ok(count) => i64::try_from(count).unwrap_or(i64::MAX),
                        Err(e) => {
                            tracing::warn!(table = %table, error = %e, "Failed to count rows");
                            -1
                        }
                    };
                    let columns: Vec<String> = match registry.schema(&table) {
                        Ok(schema) => schema.into_iter().map(|c| c.column).collect(),
                        Err(e) => {
                            tracing::warn!(table = %table, error = %e, "Failed to read schema");
                            Vec::new()
                        }
                    };
                    if row_count > 0 {
                        total_rows = total_rows.saturating_add(row_count.unsigned_abs());
                    }
                    TableSummary {
                        name: name.clone(),
                        row_count,
                        column_count: columns.len(),
                        columns,
                    }
                })
                .collect();
            SourceSummary {
                name: source.name.clone(),
                source_type: source.source_type,
                tables,
            }
        })
        .collect();

    CatalogSummary {
        total_sources: sources.len(),
        total_tables: sources
            .iter()
            .map(|s| s.tables.len())
            .fold(0, usize::saturating_add),
        total_rows,
        sources,
    }
}
