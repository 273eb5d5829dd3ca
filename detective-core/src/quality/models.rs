//! Quality scan, anomaly and schema diff report models.
//!
//! Every report serialises straight into the JSON shape returned to callers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Severity of a detected quality issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// The kind of a quality issue and its kind-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IssueKind {
    /// Rows identical across every column
    Duplicates { duplicate_groups: u64 },
    /// Rows identical once identifier-like columns are ignored
    SemanticDuplicates {
        duplicate_groups: u64,
        columns_checked: Vec<String>,
    },
    HighNullRate { null_rate: f64, null_count: u64 },
    /// A single distinct value across more than one row
    ConstantColumn,
    /// Negative values in a column expected to be non-negative
    UnexpectedNegatives { negative_count: u64 },
}

impl IssueKind {
    /// The serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            IssueKind::Duplicates { .. } => "duplicates",
            IssueKind::SemanticDuplicates { .. } => "semantic_duplicates",
            IssueKind::HighNullRate { .. } => "high_null_rate",
            IssueKind::ConstantColumn => "constant_column",
            IssueKind::UnexpectedNegatives { .. } => "unexpected_negatives",
        }
    }
}

/// A single finding of the quality scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(flatten)]
    pub kind: IssueKind,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

impl Issue {
    pub fn duplicates(duplicate_groups: u64, severity: Severity) -> Self {
        Self {
            kind: IssueKind::Duplicates { duplicate_groups },
            severity,
            column: None,
            message: format!("Found {duplicate_groups} groups of exact duplicate rows"),
        }
    }

    pub fn semantic_duplicates(
        duplicate_groups: u64,
        columns_checked: Vec<String>,
        severity: Severity,
    ) -> Self {
        Self {
            kind: IssueKind::SemanticDuplicates {
                duplicate_groups,
                columns_checked,
            },
            severity,
            column: None,
            message: format!(
                "Found {duplicate_groups} groups of rows with identical values (excluding ID columns)"
            ),
        }
    }

    pub fn high_null_rate(column: &str, null_rate: f64, null_count: u64, severity: Severity) -> Self {
        Self {
            kind: IssueKind::HighNullRate {
                null_rate,
                null_count,
            },
            severity,
            column: Some(column.to_string()),
            message: format!(
                "Column '{column}' has {:.1}% null values ({null_count} rows)",
                null_rate * 100.0
            ),
        }
    }

    pub fn constant_column(column: &str, row_count: u64) -> Self {
        Self {
            kind: IssueKind::ConstantColumn,
            severity: Severity::Low,
            column: Some(column.to_string()),
            message: format!(
                "Column '{column}' has a single constant value across all {row_count} rows"
            ),
        }
    }

    pub fn unexpected_negatives(column: &str, negative_count: u64) -> Self {
        Self {
            kind: IssueKind::UnexpectedNegatives { negative_count },
            severity: Severity::High,
            column: Some(column.to_string()),
            message: format!(
                "Column '{column}' has {negative_count} negative values (expected positive)"
            ),
        }
    }

    /// The serialized `type` tag of this issue.
    pub fn type_name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Result of a quality scan over one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub table: String,
    pub row_count: u64,
    /// Issues in discovery order
    pub issues: Vec<Issue>,
    pub issue_count: usize,
}

impl ScanReport {
    pub fn new(table: impl Into<String>, row_count: u64, issues: Vec<Issue>) -> Self {
        let issue_count = issues.len();
        Self {
            table: table.into(),
            row_count,
            issues,
            issue_count,
        }
    }

    /// Issues with the given `type` tag.
    pub fn issues_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Issue> {
        self.issues
            .iter()
            .filter(move |issue| issue.type_name() == type_name)
    }

    /// The most severe issue level, if any issue was found.
    pub fn max_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|issue| issue.severity).max()
    }
}

/// Which z-score strategy produced an anomaly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Outlier days over per-day sums
    ZScoreDailyAggregation,
    /// Outlier rows over raw values
    ZScoreRowLevel,
}

/// Side of the mean an outlier day falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

/// Population statistics an anomaly report was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyStats {
    pub mean: f64,
    pub stddev: f64,
    /// Number of day buckets (time-aggregated mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<usize>,
    /// Number of non-null values (row-level mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// An outlier day in time-aggregated mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAnomaly {
    pub day: String,
    /// Sum of the column over the day
    pub value: f64,
    /// Rows contributing to the day
    pub count: u64,
    /// Rounded to two decimals
    pub z_score: f64,
    pub direction: Direction,
}

/// An outlier row in row-level mode: the full row plus its z-score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowAnomaly {
    #[serde(flatten)]
    pub row: Map<String, JsonValue>,
    pub z_score: f64,
}

/// A single detected anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Anomaly {
    Day(DayAnomaly),
    Row(RowAnomaly),
}

impl Anomaly {
    pub fn z_score(&self) -> f64 {
        match self {
            Anomaly::Day(day) => day.z_score,
            Anomaly::Row(row) => row.z_score,
        }
    }
}

/// Result of anomaly detection on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub table: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_column: Option<String>,
    pub method: DetectionMethod,
    pub z_threshold: f64,
    /// Absent when there was not enough data to compute statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<AnomalyStats>,
    pub anomalies: Vec<Anomaly>,
    pub anomaly_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A column present on only one side of a schema comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnType {
    pub column: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

/// A column present on both sides with differing declared types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeChange {
    pub column: String,
    pub type_a: String,
    pub type_b: String,
}

/// Column-level difference between two table schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
    pub table_a: String,
    pub table_b: String,
    pub identical: bool,
    pub columns_added_in_b: Vec<ColumnType>,
    pub columns_removed_in_b: Vec<ColumnType>,
    pub type_changes: Vec<TypeChange>,
    pub diff_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert_eq!(Severity::High.to_string(), "high");
    }

    #[test]
    fn test_issue_serialization_flattens_kind() {
        let issue = Issue::high_null_rate("email", 0.25, 1, Severity::Medium);
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "high_null_rate",
                "null_rate": 0.25,
                "null_count": 1,
                "severity": "medium",
                "column": "email",
                "message": "Column 'email' has 25.0% null values (1 rows)",
            })
        );
    }

    #[test]
    fn test_table_level_issue_omits_column() {
        let issue = Issue::semantic_duplicates(
            1,
            vec!["name".to_string(), "email".to_string()],
            Severity::High,
        );
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["type"], "semantic_duplicates");
        assert_eq!(value["columns_checked"], json!(["name", "email"]));
        assert!(value.get("column").is_none());
    }

    #[test]
    fn test_issue_deserialization() {
        let issue: Issue = serde_json::from_value(json!({
            "type": "unexpected_negatives",
            "severity": "high",
            "column": "amount",
            "message": "m",
            "negative_count": 3
        }))
        .unwrap();
        assert_eq!(issue.kind, IssueKind::UnexpectedNegatives { negative_count: 3 });
        assert_eq!(issue.type_name(), "unexpected_negatives");
    }

    #[test]
    fn test_constant_column_is_low() {
        let issue = Issue::constant_column("status", 12);
        assert_eq!(issue.severity, Severity::Low);
        assert!(issue.message.contains("all 12 rows"));
    }

    #[test]
    fn test_scan_report_helpers() {
        let report = ScanReport::new(
            "orders",
            3,
            vec![
                Issue::constant_column("status", 3),
                Issue::unexpected_negatives("amount", 1),
            ],
        );
        assert_eq!(report.issue_count, 2);
        assert_eq!(report.issues_of_type("unexpected_negatives").count(), 1);
        assert_eq!(report.max_severity(), Some(Severity::High));
        assert_eq!(ScanReport::new("empty", 0, Vec::new()).max_severity(), None);
    }

    #[test]
    fn test_method_and_direction_names() {
        assert_eq!(
            serde_json::to_value(DetectionMethod::ZScoreDailyAggregation).unwrap(),
            json!("z_score_daily_aggregation")
        );
        assert_eq!(
            serde_json::to_value(DetectionMethod::ZScoreRowLevel).unwrap(),
            json!("z_score_row_level")
        );
        assert_eq!(serde_json::to_value(Direction::Below).unwrap(), json!("below"));
    }

    #[test]
    fn test_row_anomaly_flattens_row() {
        let mut row = Map::new();
        row.insert("id".to_string(), json!(4));
        row.insert("amount".to_string(), json!(1000));
        let anomaly = Anomaly::Row(RowAnomaly { row, z_score: 1.99 });

        let value = serde_json::to_value(&anomaly).unwrap();
        assert_eq!(value, json!({"id": 4, "amount": 1000, "z_score": 1.99}));
        assert_eq!(anomaly.z_score(), 1.99);
    }

    #[test]
    fn test_empty_report_omits_optional_fields() {
        let report = AnomalyReport {
            table: "sales".to_string(),
            column: "amount".to_string(),
            time_column: Some("sold_at".to_string()),
            method: DetectionMethod::ZScoreDailyAggregation,
            z_threshold: 3.0,
            stats: None,
            anomalies: Vec::new(),
            anomaly_count: 0,
            message: Some("Not enough data points for anomaly detection".to_string()),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("stats").is_none());
        assert_eq!(value["time_column"], "sold_at");
        assert_eq!(value["anomaly_count"], 0);
    }
}
