//! Z-score anomaly detection on a numeric column.
//!
//! Two modes:
//! - **Time-aggregated**: values are summed per calendar day of a time
//!   column and outlier days are flagged. Statistics are computed here over
//!   the daily sums.
//! - **Row-level**: population mean and standard deviation are computed by
//!   the backend and outlier rows are selected there, most extreme first.
//!
//! Both use population standard deviation. A zero standard deviation
//! yields no anomalies.

use super::config::AnomalyConfig;
use super::models::{
    Anomaly, AnomalyReport, AnomalyStats, DayAnomaly, DetectionMethod, Direction, RowAnomaly,
};
use crate::Result;
use crate::backend::values::{as_f64, as_u64, display_value};
use crate::backend::{Query, QueryBackend, Z_SCORE_COLUMN};
use crate::models::{Relation, TableRef};
use crate::validation::{validate_identifier, validate_optional_identifier};

/// Message attached to a time-aggregated report with too few day buckets.
pub const NOT_ENOUGH_DATA: &str = "Not enough data points for anomaly detection";

/// Calculates population mean and standard deviation.
///
/// Returns `(0.0, 0.0)` for an empty slice.
pub fn calculate_statistics(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One day of a time-aggregated column.
#[derive(Debug, Clone, PartialEq)]
struct DayBucket {
    day: String,
    value: f64,
    count: u64,
}

/// Detects statistical outliers in numeric columns.
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    /// Creates a new detector with the given configuration.
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Creates a new detector with default configuration (z threshold 3.0).
    pub fn with_defaults() -> Self {
        Self::new(AnomalyConfig::default())
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Detects anomalies in `column`, aggregated per day of `time_column` when given.
    ///
    /// # Errors
    /// - `InvalidInput` for an invalid column name or a non-positive or
    ///   non-finite z threshold, before any query runs
    /// - `Backend` if the table or columns cannot be resolved
    pub fn detect(
        &self,
        backend: &dyn QueryBackend,
        table: &TableRef,
        column: &str,
        time_column: Option<&str>,
    ) -> Result<AnomalyReport> {
        self.config.validate()?;
        let column = validate_identifier(column, "column")?;
        let time_column = validate_optional_identifier(time_column, "time column")?;
        let relation = backend.resolve(table);

        let report = match time_column {
            Some(time_column) => self.detect_daily(backend, table, &relation, column, time_column)?,
            None => self.detect_rows(backend, table, &relation, column)?,
        };

        tracing::info!(
            table = %table,
            column = %report.column,
            anomalies = report.anomaly_count,
            "Anomaly detection complete"
        );
        Ok(report)
    }

    fn detect_daily(
        &self,
        backend: &dyn QueryBackend,
        table: &TableRef,
        relation: &Relation,
        column: String,
        time_column: String,
    ) -> Result<AnomalyReport> {
        let result = backend.run(&Query::DailyTotals {
            relation: relation.clone(),
            value_column: column.clone(),
            time_column: time_column.clone(),
            max_buckets: self.config.max_time_buckets,
        })?;

        let buckets: Vec<DayBucket> = result
            .rows
            .iter()
            .filter_map(|row| {
                let day = row.first().filter(|v| !v.is_null()).map(display_value)?;
                let value = as_f64(row.get(1)?)?;
                let count = row.get(2).and_then(as_u64).unwrap_or(0);
                Some(DayBucket { day, value, count })
            })
            .collect();

        let mut report = AnomalyReport {
            table: table.table().to_string(),
            column,
            time_column: Some(time_column),
            method: DetectionMethod::ZScoreDailyAggregation,
            z_threshold: self.config.z_threshold,
            stats: None,
            anomalies: Vec::new(),
            anomaly_count: 0,
            message: None,
        };

        if buckets.len() < self.config.min_time_buckets {
            tracing::debug!(days = buckets.len(), "Too few day buckets for anomaly detection");
            report.message = Some(NOT_ENOUGH_DATA.to_string());
            return Ok(report);
        }

        let values: Vec<f64> = buckets.iter().map(|b| b.value).collect();
        let (mean, stddev) = calculate_statistics(&values);
        report.anomalies = flag_days(&buckets, mean, stddev, self.config.z_threshold);
        report.anomaly_count = report.anomalies.len();
        report.stats = Some(AnomalyStats {
            mean,
            stddev,
            days: Some(buckets.len()),
            count: None,
        });
        Ok(report)
    }

    fn detect_rows(
        &self,
        backend: &dyn QueryBackend,
        table: &TableRef,
        relation: &Relation,
        column: String,
    ) -> Result<AnomalyReport> {
        let moments = backend.run(&Query::Moments {
            relation: relation.clone(),
            column: column.clone(),
        })?;
        let first = moments.rows.first();
        let cell = |idx: usize| first.and_then(|row| row.get(idx));
        let mean = cell(0).and_then(as_f64).unwrap_or(0.0);
        let stddev = cell(1).and_then(as_f64).unwrap_or(0.0);
        let count = cell(2).and_then(as_u64).unwrap_or(0);

        let mut anomalies = Vec::new();
        if stddev > 0.0 {
            let outliers = backend.run(&Query::Outliers {
                relation: relation.clone(),
                column: column.clone(),
                mean,
                stddev,
                threshold: self.config.z_threshold,
                limit: self.config.max_outlier_rows,
            })?;
            anomalies = outliers
                .into_records()
                .into_iter()
                .map(|mut row| {
                    let z_score = row
                        .remove(Z_SCORE_COLUMN)
                        .as_ref()
                        .and_then(as_f64)
                        .unwrap_or(0.0);
                    Anomaly::Row(RowAnomaly { row, z_score })
                })
                .collect();
        }

        Ok(AnomalyReport {
            table: table.table().to_string(),
            column,
            time_column: None,
            method: DetectionMethod::ZScoreRowLevel,
            z_threshold: self.config.z_threshold,
            stats: Some(AnomalyStats {
                mean,
                stddev,
                days: None,
                count: Some(count),
            }),
            anomaly_count: anomalies.len(),
            anomalies,
            message: None,
        })
    }
}

/// Flags days whose |z| reaches the threshold; none when stddev is zero.
fn flag_days(buckets: &[DayBucket], mean: f64, stddev: f64, z_threshold: f64) -> Vec<Anomaly> {
    if stddev <= 0.0 {
        return Vec::new();
    }
    buckets
        .iter()
        .filter_map(|bucket| {
            let z = (bucket.value - mean) / stddev;
            (z.abs() >= z_threshold).then(|| {
                Anomaly::Day(DayAnomaly {
                    day: bucket.day.clone(),
                    value: bucket.value,
                    count: bucket.count,
                    z_score: round2(z),
                    direction: if z > 0.0 {
                        Direction::Above
                    } else {
                        Direction::Below
                    },
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(day: &str, value: f64) -> DayBucket {
        DayBucket {
            day: day.to_string(),
            value,
            count: 1,
        }
    }

    #[test]
    fn test_calculate_statistics_population() {
        let (mean, std) = calculate_statistics(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-12);
        assert!((std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_calculate_statistics_empty_and_constant() {
        assert_eq!(calculate_statistics(&[]), (0.0, 0.0));
        assert_eq!(calculate_statistics(&[7.0, 7.0, 7.0]), (7.0, 0.0));
    }

    #[test]
    fn test_calculate_statistics_outlier_example() {
        let (mean, std) = calculate_statistics(&[10.0, 20.0, 30.0, 1000.0, 25.0]);
        assert!((mean - 217.0).abs() < 1e-9);
        let z = (1000.0 - mean) / std;
        assert!(z > 1.99 && z < 2.01, "z = {z}");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(-2.005_1), -2.01);
    }

    #[test]
    fn test_flag_days_direction_and_rounding() {
        let buckets = vec![
            bucket("2024-01-01", 100.0),
            bucket("2024-01-02", 100.0),
            bucket("2024-01-03", 100.0),
            bucket("2024-01-04", 100.0),
            bucket("2024-01-05", 10.0),
        ];
        let values: Vec<f64> = buckets.iter().map(|b| b.value).collect();
        let (mean, std) = calculate_statistics(&values);
        let flagged = flag_days(&buckets, mean, std, 1.5);

        assert_eq!(flagged.len(), 1);
        match &flagged[0] {
            Anomaly::Day(day) => {
                assert_eq!(day.day, "2024-01-05");
                assert_eq!(day.direction, Direction::Below);
                assert_eq!(day.z_score, -2.0);
            }
            other => panic!("expected a day anomaly, got {other:?}"),
        }
    }

    #[test]
    fn test_flag_days_zero_stddev() {
        let buckets = vec![bucket("a", 5.0), bucket("b", 5.0), bucket("c", 5.0)];
        assert!(flag_days(&buckets, 5.0, 0.0, 0.1).is_empty());
    }

    #[test]
    fn test_detect_rejects_bad_column_before_query() {
        let registry = crate::backend::SourceRegistry::new().unwrap();
        let table = TableRef::new("missing", None).unwrap();
        let err = AnomalyDetector::with_defaults()
            .detect(&registry, &table, "amount; --", None)
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_detect_rejects_bad_threshold_before_query() {
        let registry = crate::backend::SourceRegistry::new().unwrap();
        let table = TableRef::new("missing", None).unwrap();
        let detector = AnomalyDetector::new(AnomalyConfig::new().with_z_threshold(0.0));
        let err = detector.detect(&registry, &table, "amount", None).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
