//! Core library for the data detective.
//!
//! Connects SQLite databases, Parquet files and CSV files through one
//! in-memory DuckDB instance and runs data-quality checks, anomaly
//! detection, profiling and exploration queries over them in a single SQL
//! dialect.
//!
//! # Guarantees
//! - Every table, column and source name is validated before it reaches SQL
//! - All analysis is read-only; SQLite sources are attached `READ_ONLY`
//! - Each call evaluates a full table snapshot; nothing is persisted
//!
//! # Architecture
//! - [`backend`]: the `QueryBackend` seam, the typed query builder and the
//!   DuckDB-backed `SourceRegistry`
//! - [`quality`]: quality scanner, anomaly detector, schema comparator
//! - [`profile`]: column profiles and catalog summaries
//! - [`explore`]: listing, ad-hoc queries, sampling and export

pub mod backend;
pub mod error;
pub mod explore;
pub mod logging;
pub mod models;
pub mod profile;
pub mod quality;
pub mod validation;

// Re-export commonly used types
pub use backend::{Query, QueryBackend, SourceRegistry};
pub use error::{DetectiveError, Result};
pub use models::{
    ColumnSchema, DataSource, QueryResult, Relation, SourceType, TableEntry, TableRef,
    is_numeric_type,
};
pub use profile::{CatalogSummary, ProfileConfig, Profiler, TableProfile, summarize};
pub use quality::{
    AnomalyConfig, AnomalyDetector, AnomalyReport, QualityConfig, QualityScanner, ScanReport,
    SchemaDiff, Severity, compare_schemas,
};
pub use validation::{validate_identifier, validate_path};
