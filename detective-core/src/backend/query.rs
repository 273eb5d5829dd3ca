//! Typed query builder.
//!
//! Every statement the analysis code issues is one of the [`Query`] kinds
//! below. Identifier quoting and numeric literal rendering happen only
//! here, so the statistical code never handles SQL text directly.

use crate::models::Relation;

/// Quotes an identifier for DuckDB, doubling embedded double quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Renders a float as an explicitly typed DOUBLE literal.
fn double_literal(value: f64) -> String {
    format!("{value:?}::DOUBLE")
}

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Alias of the computed z-score column in outlier queries.
pub const Z_SCORE_COLUMN: &str = "_anomaly_z_score";

/// Row filters supported by [`Query::Count`].
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Rows where the column is NULL
    IsNull(String),
    /// Rows where the column is below zero
    Negative(String),
}

impl Predicate {
    fn to_sql(&self) -> String {
        match self {
            Predicate::IsNull(column) => format!("{} IS NULL", quote_ident(column)),
            Predicate::Negative(column) => format!("{} < 0", quote_ident(column)),
        }
    }
}

/// The read-only queries the analysis tools issue against a relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// `COUNT(*)`, optionally filtered
    Count {
        relation: Relation,
        predicate: Option<Predicate>,
    },
    /// `COUNT(DISTINCT column)`
    DistinctCount { relation: Relation, column: String },
    /// Number of groups over `columns` that occur more than once
    DuplicateGroups {
        relation: Relation,
        columns: Vec<String>,
    },
    /// MIN, MAX, AVG, MEDIAN and sample STDDEV of a column, as doubles
    NumericSummary { relation: Relation, column: String },
    /// Population mean, population stddev and count of non-null values
    Moments { relation: Relation, column: String },
    /// Per-day sum and row count of `value_column`, ordered by day; rows
    /// without a timestamp belong to no day
    DailyTotals {
        relation: Relation,
        value_column: String,
        time_column: String,
        max_buckets: usize,
    },
    /// Full rows whose z-score magnitude reaches `threshold`, most extreme first
    Outliers {
        relation: Relation,
        column: String,
        mean: f64,
        stddev: f64,
        threshold: f64,
        limit: usize,
    },
    /// Most frequent values of a column with their counts
    ValueHistogram {
        relation: Relation,
        column: String,
        limit: usize,
    },
    /// Column names, types and nullability
    Describe { relation: Relation },
    /// A random sample of rows
    Sample { relation: Relation, rows: usize },
}

impl Query {
    /// Counts every row of `relation`.
    pub fn count(relation: &Relation) -> Self {
        Query::Count {
            relation: relation.clone(),
            predicate: None,
        }
    }

    /// Counts the rows of `relation` matching `predicate`.
    ///
    /// # Example
    /// ```rust
    /// use detective_core::Relation;
    /// use detective_core::backend::{Predicate, Query};
    ///
    /// let orders = Relation::bare("orders");
    /// let query = Query::count_where(&orders, Predicate::Negative("amount".into()));
    /// assert_eq!(query.to_sql(), r#"SELECT COUNT(*) FROM "orders" WHERE "amount" < 0"#);
    /// ```
    pub fn count_where(relation: &Relation, predicate: Predicate) -> Self {
        Query::Count {
            relation: relation.clone(),
            predicate: Some(predicate),
        }
    }

    /// Counts distinct non-null values of `column`.
    pub fn distinct_count(relation: &Relation, column: &str) -> Self {
        Query::DistinctCount {
            relation: relation.clone(),
            column: column.to_string(),
        }
    }

    /// Short name used in debug logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Query::Count { .. } => "count",
            Query::DistinctCount { .. } => "distinct_count",
            Query::DuplicateGroups { .. } => "duplicate_groups",
            Query::NumericSummary { .. } => "numeric_summary",
            Query::Moments { .. } => "moments",
            Query::DailyTotals { .. } => "daily_totals",
            Query::Outliers { .. } => "outliers",
            Query::ValueHistogram { .. } => "value_histogram",
            Query::Describe { .. } => "describe",
            Query::Sample { .. } => "sample",
        }
    }

    /// Renders the query as DuckDB SQL.
    pub fn to_sql(&self) -> String {
        match self {
            Query::Count {
                relation,
                predicate: None,
            } => format!("SELECT COUNT(*) FROM {relation}"),
            Query::Count {
                relation,
                predicate: Some(predicate),
            } => format!(
                "SELECT COUNT(*) FROM {relation} WHERE {}",
                predicate.to_sql()
            ),
            Query::DistinctCount { relation, column } => format!(
                "SELECT COUNT(DISTINCT {}) FROM {relation}",
                quote_ident(column)
            ),
            Query::DuplicateGroups { relation, columns } => {
                let cols = column_list(columns);
                format!(
                    "SELECT COUNT(*) FROM (SELECT 1 FROM {relation} GROUP BY {cols} HAVING COUNT(*) > 1)"
                )
            }
            Query::NumericSummary { relation, column } => {
                let c = quote_ident(column);
                format!(
                    "SELECT CAST(MIN({c}) AS DOUBLE), CAST(MAX({c}) AS DOUBLE), \
                     CAST(AVG({c}) AS DOUBLE), CAST(MEDIAN({c}) AS DOUBLE), \
                     CAST(STDDEV_SAMP({c}) AS DOUBLE) FROM {relation}"
                )
            }
            Query::Moments { relation, column } => {
                let c = quote_ident(column);
                format!(
                    "SELECT CAST(AVG({c}) AS DOUBLE), CAST(STDDEV_POP({c}) AS DOUBLE), COUNT(*) \
                     FROM {relation} WHERE {c} IS NOT NULL"
                )
            }
            Query::DailyTotals {
                relation,
                value_column,
                time_column,
                max_buckets,
            } => {
                let v = quote_ident(value_column);
                let t = quote_ident(time_column);
                format!(
                    "SELECT CAST(CAST({t} AS DATE) AS VARCHAR) AS bucket_day, \
                     CAST(SUM({v}) AS DOUBLE) AS daily_value, COUNT(*) AS daily_count \
                     FROM {relation} WHERE {v} IS NOT NULL AND {t} IS NOT NULL \
                     GROUP BY 1 ORDER BY 1 LIMIT {max_buckets}"
                )
            }
            Query::Outliers {
                relation,
                column,
                mean,
                stddev,
                threshold,
                limit,
            } => {
                let c = quote_ident(column);
                let z = format!(
                    "({c} - {}) / {}",
                    double_literal(*mean),
                    double_literal(*stddev)
                );
                format!(
                    "SELECT *, {z} AS {} FROM {relation} \
                     WHERE {c} IS NOT NULL AND ABS({z}) >= {} \
                     ORDER BY ABS({z}) DESC LIMIT {limit}",
                    quote_ident(Z_SCORE_COLUMN),
                    double_literal(*threshold)
                )
            }
            Query::ValueHistogram {
                relation,
                column,
                limit,
            } => {
                let c = quote_ident(column);
                format!(
                    "SELECT {c} AS val, COUNT(*) AS cnt FROM {relation} \
                     GROUP BY {c} ORDER BY cnt DESC, val ASC NULLS LAST LIMIT {limit}"
                )
            }
            Query::Describe { relation } => format!("DESCRIBE {relation}"),
            Query::Sample { relation, rows } => {
                format!("SELECT * FROM {relation} USING SAMPLE {rows} ROWS")
            }
        }
    }
}
