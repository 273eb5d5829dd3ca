//! Data quality and anomaly detection.
//!
//! This module provides:
//! - **Quality scanning**: duplicate rows, semantic duplicates, high null
//!   rates, constant columns and negative values in positive columns
//! - **Anomaly detection**: row-level and time-aggregated z-score outliers
//! - **Schema comparison**: added, removed and retyped columns
//!
//! All checks run as aggregate queries against a live [`QueryBackend`];
//! nothing is persisted between calls.
//!
//! # Example
//! ```rust,no_run
//! use detective_core::backend::SourceRegistry;
//! use detective_core::models::TableRef;
//! use detective_core::quality::{AnomalyConfig, AnomalyDetector, AnomalySensitivity};
//!
//! let registry = SourceRegistry::new()?;
//! let detector = AnomalyDetector::new(
//!     AnomalyConfig::new().with_sensitivity(AnomalySensitivity::High),
//! );
//! let table = TableRef::new("sales", None)?;
//! let report = detector.detect(&registry, &table, "amount", Some("sold_at"))?;
//! println!("{} anomalous days", report.anomaly_count);
//! # Ok::<(), detective_core::DetectiveError>(())
//! ```
//!
//! [`QueryBackend`]: crate::backend::QueryBackend

mod anomaly;
mod compare;
mod config;
mod models;
mod scanner;

// Re-export public API
pub use anomaly::{AnomalyDetector, NOT_ENOUGH_DATA, calculate_statistics};
pub use compare::{compare_schemas, diff_schemas};
pub use config::{
    AnomalyConfig, AnomalySensitivity, ConfigValidationError, DEFAULT_ID_SUFFIXES,
    DEFAULT_POSITIVE_KEYWORDS, QualityConfig,
};
pub use models::{
    Anomaly, AnomalyReport, AnomalyStats, ColumnType, DayAnomaly, DetectionMethod, Direction,
    Issue, IssueKind, RowAnomaly, ScanReport, SchemaDiff, Severity, TypeChange,
};
pub use scanner::QualityScanner;
