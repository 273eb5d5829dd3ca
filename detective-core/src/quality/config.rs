//! Quality scan and anomaly detection configuration.
//!
//! Thresholds for the quality scanner and the z-score anomaly detector.
//! Builder methods clamp out-of-range values with a warning; `validate()`
//! reports values that were set directly on the public fields.

use crate::DetectiveError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column-name fragments of columns expected to hold non-negative values.
pub const DEFAULT_POSITIVE_KEYWORDS: &[&str] = &[
    "price", "amount", "total", "quantity", "qty", "count", "cost", "revenue", "fee",
];

/// Column-name suffixes that mark identifier columns.
pub const DEFAULT_ID_SUFFIXES: &[&str] = &["_id", "id"];

/// Anomaly detection sensitivity level.
///
/// Controls how many standard deviations from the mean a value
/// must be to be considered an outlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySensitivity {
    /// 3.0 standard deviations - fewer false positives
    #[default]
    Low,
    /// 2.5 standard deviations - balanced detection
    Medium,
    /// 2.0 standard deviations - more aggressive detection
    High,
}

impl AnomalySensitivity {
    /// Returns the z-score threshold for this sensitivity level.
    pub fn z_score_threshold(&self) -> f64 {
        match self {
            AnomalySensitivity::Low => 3.0,
            AnomalySensitivity::Medium => 2.5,
            AnomalySensitivity::High => 2.0,
        }
    }
}

/// Validation errors for quality and anomaly configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("null_rate_threshold must be between 0.0 and 1.0, got {0}")]
    InvalidNullRate(f64),
    #[error("high_null_rate_threshold must be between 0.0 and 1.0, got {0}")]
    InvalidHighNullRate(f64),
    #[error("null_rate_threshold ({low}) must not exceed high_null_rate_threshold ({high})")]
    NullRateOrder { low: f64, high: f64 },
    #[error("duplicate_high_ratio must be between 0.0 and 1.0, got {0}")]
    InvalidDuplicateRatio(f64),
    #[error("z_threshold must be a positive finite number, got {0}")]
    InvalidZThreshold(f64),
    #[error("min_time_buckets ({min}) must be at least 1 and not exceed max_time_buckets ({max})")]
    InvalidTimeBuckets { min: usize, max: usize },
    #[error("max_outlier_rows must be at least 1")]
    InvalidOutlierLimit,
}

impl From<ConfigValidationError> for DetectiveError {
    fn from(err: ConfigValidationError) -> Self {
        match err {
            ConfigValidationError::InvalidZThreshold(_) => {
                DetectiveError::invalid_input("z_threshold", err.to_string())
            }
            other => DetectiveError::configuration(other.to_string()),
        }
    }
}

/// Quality scanner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Null rate above which a column is reported (0.0-1.0)
    pub null_rate_threshold: f64,
    /// Null rate above which the report is high severity (0.0-1.0)
    pub high_null_rate_threshold: f64,
    /// Duplicate groups per row above which duplicates are high severity
    pub duplicate_high_ratio: f64,
    /// Column-name fragments that mark values expected to be non-negative
    pub positive_keywords: Vec<String>,
    /// Column-name suffixes excluded from the semantic duplicate check
    pub id_suffixes: Vec<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            null_rate_threshold: 0.05,
            high_null_rate_threshold: 0.30,
            duplicate_high_ratio: 0.01,
            positive_keywords: DEFAULT_POSITIVE_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            id_suffixes: DEFAULT_ID_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl QualityConfig {
    /// Creates a new quality config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the reporting null rate.
    pub fn with_null_rate_threshold(mut self, threshold: f64) -> Self {
        if !(0.0..=1.0).contains(&threshold) {
            tracing::warn!(
                "null_rate_threshold {} clamped to valid range [0.0, 1.0]",
                threshold
            );
        }
        self.null_rate_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Builder method to set the high-severity null rate.
    pub fn with_high_null_rate_threshold(mut self, threshold: f64) -> Self {
        if !(0.0..=1.0).contains(&threshold) {
            tracing::warn!(
                "high_null_rate_threshold {} clamped to valid range [0.0, 1.0]",
                threshold
            );
        }
        self.high_null_rate_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Builder method to set the high-severity duplicate ratio.
    pub fn with_duplicate_high_ratio(mut self, ratio: f64) -> Self {
        if !(0.0..=1.0).contains(&ratio) {
            tracing::warn!(
                "duplicate_high_ratio {} clamped to valid range [0.0, 1.0]",
                ratio
            );
        }
        self.duplicate_high_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Builder method to replace the positive-value keywords.
    pub fn with_positive_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positive_keywords = keywords.into_iter().map(|k| k.into().to_lowercase()).collect();
        self
    }

    /// Builder method to replace the identifier suffixes.
    pub fn with_id_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_suffixes = suffixes.into_iter().map(|s| s.into().to_lowercase()).collect();
        self
    }

    /// True when the column name contains a positive-value keyword (case-insensitive).
    pub fn expects_positive(&self, column: &str) -> bool {
        let lowered = column.to_lowercase();
        self.positive_keywords
            .iter()
            .any(|kw| lowered.contains(kw.as_str()))
    }

    /// True when the column name ends in an identifier suffix (case-insensitive).
    pub fn is_id_like(&self, column: &str) -> bool {
        let lowered = column.to_lowercase();
        self.id_suffixes
            .iter()
            .any(|suffix| lowered.ends_with(suffix.as_str()))
    }

    /// Validates the configuration.
    ///
    /// Returns an error if any threshold is outside valid range.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.null_rate_threshold) {
            return Err(ConfigValidationError::InvalidNullRate(
                self.null_rate_threshold,
            ));
        }
        if !(0.0..=1.0).contains(&self.high_null_rate_threshold) {
            return Err(ConfigValidationError::InvalidHighNullRate(
                self.high_null_rate_threshold,
            ));
        }
        if self.null_rate_threshold > self.high_null_rate_threshold {
            return Err(ConfigValidationError::NullRateOrder {
                low: self.null_rate_threshold,
                high: self.high_null_rate_threshold,
            });
        }
        if !(0.0..=1.0).contains(&self.duplicate_high_ratio) {
            return Err(ConfigValidationError::InvalidDuplicateRatio(
                self.duplicate_high_ratio,
            ));
        }
        Ok(())
    }
}

/// Anomaly detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Minimum |z| for a value to be reported
    pub z_threshold: f64,
    /// Cap on rows returned by row-level detection
    pub max_outlier_rows: usize,
    /// Fewer day buckets than this yields an empty report
    pub min_time_buckets: usize,
    /// Cap on day buckets read by time-aggregated detection
    pub max_time_buckets: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            z_threshold: AnomalySensitivity::Low.z_score_threshold(),
            max_outlier_rows: 100,
            min_time_buckets: 3,
            max_time_buckets: 10_000,
        }
    }
}

impl AnomalyConfig {
    /// Creates a new anomaly config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the threshold from a sensitivity preset.
    pub fn with_sensitivity(mut self, sensitivity: AnomalySensitivity) -> Self {
        self.z_threshold = sensitivity.z_score_threshold();
        self
    }

    /// Builder method to set an explicit z-score threshold.
    ///
    /// Not clamped: a non-positive or non-finite value is rejected by
    /// `validate()` when detection runs.
    pub fn with_z_threshold(mut self, z_threshold: f64) -> Self {
        self.z_threshold = z_threshold;
        self
    }

    /// Builder method to cap the rows returned by row-level detection.
    pub fn with_max_outlier_rows(mut self, rows: usize) -> Self {
        if rows == 0 {
            tracing::warn!("max_outlier_rows 0 clamped to 1");
        }
        self.max_outlier_rows = rows.max(1);
        self
    }

    /// Builder method to set the minimum number of day buckets.
    pub fn with_min_time_buckets(mut self, buckets: usize) -> Self {
        if buckets == 0 {
            tracing::warn!("min_time_buckets 0 clamped to 1");
        }
        self.min_time_buckets = buckets.max(1);
        self
    }

    /// Builder method to cap the number of day buckets read.
    pub fn with_max_time_buckets(mut self, buckets: usize) -> Self {
        if buckets < self.min_time_buckets {
            tracing::warn!(
                "max_time_buckets {} raised to min_time_buckets {}",
                buckets,
                self.min_time_buckets
            );
        }
        self.max_time_buckets = buckets.max(self.min_time_buckets);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err(ConfigValidationError::InvalidZThreshold(self.z_threshold));
        }
        if self.min_time_buckets == 0 || self.min_time_buckets > self.max_time_buckets {
            return Err(ConfigValidationError::InvalidTimeBuckets {
                min: self.min_time_buckets,
                max: self.max_time_buckets,
            });
        }
        if self.max_outlier_rows == 0 {
            return Err(ConfigValidationError::InvalidOutlierLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_sensitivity_z_scores() {
        assert_eq!(AnomalySensitivity::Low.z_score_threshold(), 3.0);
        assert_eq!(AnomalySensitivity::Medium.z_score_threshold(), 2.5);
        assert_eq!(AnomalySensitivity::High.z_score_threshold(), 2.0);
    }

    #[test]
    fn test_anomaly_config_default() {
        let config = AnomalyConfig::default();
        assert_eq!(config.z_threshold, 3.0);
        assert_eq!(config.max_outlier_rows, 100);
        assert_eq!(config.min_time_buckets, 3);
        assert_eq!(config.max_time_buckets, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_anomaly_config_builder() {
        let config = AnomalyConfig::new()
            .with_sensitivity(AnomalySensitivity::High)
            .with_max_outlier_rows(0)
            .with_min_time_buckets(5)
            .with_max_time_buckets(2);

        assert_eq!(config.z_threshold, 2.0);
        assert_eq!(config.max_outlier_rows, 1);
        assert_eq!(config.min_time_buckets, 5);
        assert_eq!(config.max_time_buckets, 5);
    }

    #[test]
    fn test_anomaly_config_rejects_bad_threshold() {
        for z in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = AnomalyConfig::new().with_z_threshold(z);
            assert!(matches!(
                config.validate(),
                Err(ConfigValidationError::InvalidZThreshold(_))
            ));
        }
    }

    #[test]
    fn test_z_threshold_error_is_invalid_input() {
        let err: DetectiveError = ConfigValidationError::InvalidZThreshold(-2.0).into();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("z_threshold"));

        let err: DetectiveError = ConfigValidationError::InvalidOutlierLimit.into();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[test]
    fn test_quality_config_default() {
        let config = QualityConfig::default();
        assert_eq!(config.null_rate_threshold, 0.05);
        assert_eq!(config.high_null_rate_threshold, 0.30);
        assert_eq!(config.duplicate_high_ratio, 0.01);
        assert_eq!(config.positive_keywords.len(), 9);
        assert_eq!(config.id_suffixes, vec!["_id", "id"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_quality_config_builder_clamps() {
        let config = QualityConfig::new()
            .with_null_rate_threshold(-0.5)
            .with_high_null_rate_threshold(1.5)
            .with_duplicate_high_ratio(2.0);

        assert_eq!(config.null_rate_threshold, 0.0);
        assert_eq!(config.high_null_rate_threshold, 1.0);
        assert_eq!(config.duplicate_high_ratio, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_quality_config_validation() {
        let mut config = QualityConfig::default();
        config.null_rate_threshold = 1.5;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidNullRate(1.5))
        );

        let mut config = QualityConfig::default();
        config.null_rate_threshold = 0.5;
        config.high_null_rate_threshold = 0.2;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::NullRateOrder { .. })
        ));
    }

    #[test]
    fn test_keyword_and_suffix_matching() {
        let config = QualityConfig::default();
        assert!(config.expects_positive("Total_Amount"));
        assert!(config.expects_positive("unit_price"));
        assert!(!config.expects_positive("balance"));

        assert!(config.is_id_like("user_id"));
        assert!(config.is_id_like("ID"));
        assert!(config.is_id_like("orderid"));
        assert!(!config.is_id_like("name"));
    }

    #[test]
    fn test_custom_keywords_are_lowercased() {
        let config = QualityConfig::new()
            .with_positive_keywords(["Balance"])
            .with_id_suffixes(["_KEY"]);
        assert!(config.expects_positive("account_balance"));
        assert!(!config.expects_positive("amount"));
        assert!(config.is_id_like("customer_key"));
    }
}
