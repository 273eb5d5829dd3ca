//! Structural quality checks over one table.
//!
//! The scanner issues a bounded number of aggregate queries per table:
//! one row count, at most two duplicate-group counts, and two or three
//! counts per column. No rows are pulled to the client.

use super::config::QualityConfig;
use super::models::{Issue, ScanReport, Severity};
use crate::Result;
use crate::backend::{Predicate, Query, QueryBackend};
use crate::models::{ColumnSchema, Relation, TableRef};

/// Runs the fixed battery of quality checks against tables.
///
/// # Example
/// ```rust,no_run
/// use detective_core::backend::SourceRegistry;
/// use detective_core::models::TableRef;
/// use detective_core::quality::QualityScanner;
///
/// let registry = SourceRegistry::new()?;
/// let scanner = QualityScanner::with_defaults();
/// let report = scanner.scan(&registry, &TableRef::new("orders", None)?)?;
/// println!("{} issues", report.issue_count);
/// # Ok::<(), detective_core::DetectiveError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct QualityScanner {
    config: QualityConfig,
}

impl QualityScanner {
    /// Creates a new scanner with the given configuration.
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Creates a new scanner with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(QualityConfig::default())
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Scans a table and returns its issues in discovery order.
    ///
    /// Order: exact duplicates, semantic duplicates, then per column (in
    /// schema order) high null rate, constant column, unexpected negatives.
    /// An empty table yields no issues.
    ///
    /// # Errors
    /// Returns `DetectiveError::Backend` if the table cannot be resolved or
    /// a check query fails, and `Configuration` for an invalid config.
    pub fn scan(&self, backend: &dyn QueryBackend, table: &TableRef) -> Result<ScanReport> {
        self.config.validate()?;

        let relation = backend.resolve(table);
        let row_count = backend.count(&Query::count(&relation))?;
        if row_count == 0 {
            tracing::info!(table = %table, "Table is empty; no quality checks run");
            return Ok(ScanReport::new(table.table(), 0, Vec::new()));
        }

        let schema = backend.schema(table)?;
        let mut issues = Vec::new();

        self.check_duplicates(backend, &relation, &schema, row_count, &mut issues)?;
        for column in &schema {
            self.check_column(backend, &relation, column, row_count, &mut issues)?;
        }

        let report = ScanReport::new(table.table(), row_count, issues);
        tracing::info!(
            table = %table,
            row_count,
            issues = report.issue_count,
            max_severity = ?report.max_severity(),
            "Quality scan complete"
        );
        Ok(report)
    }

    fn check_duplicates(
        &self,
        backend: &dyn QueryBackend,
        relation: &Relation,
        schema: &[ColumnSchema],
        row_count: u64,
        issues: &mut Vec<Issue>,
    ) -> Result<()> {
        if schema.is_empty() {
            return Ok(());
        }

        let all_columns: Vec<String> = schema.iter().map(|c| c.column.clone()).collect();
        let exact = backend.count(&Query::DuplicateGroups {
            relation: relation.clone(),
            columns: all_columns.clone(),
        })?;
        if exact > 0 {
            issues.push(Issue::duplicates(exact, self.duplicate_severity(exact, row_count)));
        }

        let non_id: Vec<String> = all_columns
            .into_iter()
            .filter(|c| !self.config.is_id_like(c))
            .collect();
        if non_id.is_empty() || non_id.len() == schema.len() {
            return Ok(());
        }

        let semantic = backend.count(&Query::DuplicateGroups {
            relation: relation.clone(),
            columns: non_id.clone(),
        })?;
        // Same count as the exact check reports nothing new.
        if semantic > 0 && semantic != exact {
            issues.push(Issue::semantic_duplicates(
                semantic,
                non_id,
                self.duplicate_severity(semantic, row_count),
            ));
        }
        Ok(())
    }

    fn check_column(
        &self,
        backend: &dyn QueryBackend,
        relation: &Relation,
        column: &ColumnSchema,
        row_count: u64,
        issues: &mut Vec<Issue>,
    ) -> Result<()> {
        let name = column.column.as_str();

        let null_count = backend.count(&Query::count_where(
            relation,
            Predicate::IsNull(name.to_string()),
        ))?;
        let null_rate = null_count as f64 / row_count as f64;
        if null_rate > self.config.null_rate_threshold {
            let severity = if null_rate > self.config.high_null_rate_threshold {
                Severity::High
            } else {
                Severity::Medium
            };
            issues.push(Issue::high_null_rate(name, null_rate, null_count, severity));
        }

        let distinct = backend.count(&Query::distinct_count(relation, name))?;
        if distinct == 1 && row_count > 1 {
            issues.push(Issue::constant_column(name, row_count));
        }

        if column.is_numeric() && self.config.expects_positive(name) {
            let negatives = backend.count(&Query::count_where(
                relation,
                Predicate::Negative(name.to_string()),
            ))?;
            if negatives > 0 {
                issues.push(Issue::unexpected_negatives(name, negatives));
            }
        }
        Ok(())
    }

    fn duplicate_severity(&self, groups: u64, row_count: u64) -> Severity {
        if groups as f64 > row_count as f64 * self.config.duplicate_high_ratio {
            Severity::High
        } else {
            Severity::Medium
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SourceRegistry;

    fn registry(sql: &str) -> SourceRegistry {
        let registry = SourceRegistry::new().unwrap();
        registry.connection().execute_batch(sql).unwrap();
        registry
    }

    fn table(name: &str) -> TableRef {
        TableRef::new(name, None).unwrap()
    }

    #[test]
    fn test_duplicate_severity_boundary() {
        let scanner = QualityScanner::with_defaults();
        // 1% of 1000 rows is 10 groups; only strictly more is high.
        assert_eq!(scanner.duplicate_severity(10, 1000), Severity::Medium);
        assert_eq!(scanner.duplicate_severity(11, 1000), Severity::High);
        assert_eq!(scanner.duplicate_severity(1, 4), Severity::High);
    }

    #[test]
    fn test_empty_table_has_no_issues() {
        let registry = registry("CREATE TABLE empty_t (id INTEGER, amount DOUBLE);");
        let report = QualityScanner::with_defaults()
            .scan(&registry, &table("empty_t"))
            .unwrap();
        assert_eq!(report.row_count, 0);
        assert_eq!(report.issue_count, 0);
    }

    #[test]
    fn test_single_row_is_never_constant() {
        let registry = registry("CREATE TABLE one (status VARCHAR); INSERT INTO one VALUES ('ok');");
        let report = QualityScanner::with_defaults()
            .scan(&registry, &table("one"))
            .unwrap();
        assert_eq!(report.issues_of_type("constant_column").count(), 0);
    }

    #[test]
    fn test_constant_column_detected() {
        let registry = registry(
            "CREATE TABLE t (id INTEGER, status VARCHAR);
             INSERT INTO t VALUES (1, 'ok'), (2, 'ok'), (3, 'ok');",
        );
        let report = QualityScanner::with_defaults().scan(&registry, &table("t")).unwrap();
        let constant: Vec<_> = report.issues_of_type("constant_column").collect();
        assert_eq!(constant.len(), 1);
        assert_eq!(constant[0].column.as_deref(), Some("status"));
        assert_eq!(constant[0].severity, Severity::Low);
    }

    #[test]
    fn test_null_rate_severity_escalates() {
        let registry = registry(
            "CREATE TABLE t (id INTEGER, note VARCHAR);
             INSERT INTO t VALUES (1, NULL), (2, NULL), (3, 'x'), (4, 'y');",
        );
        let report = QualityScanner::with_defaults().scan(&registry, &table("t")).unwrap();
        let nulls: Vec<_> = report.issues_of_type("high_null_rate").collect();
        assert_eq!(nulls.len(), 1);
        assert_eq!(nulls[0].severity, Severity::High);
    }

    #[test]
    fn test_negatives_ignored_for_text_columns() {
        let registry = registry(
            "CREATE TABLE t (id INTEGER, amount VARCHAR);
             INSERT INTO t VALUES (1, '-5'), (2, '7');",
        );
        let report = QualityScanner::with_defaults().scan(&registry, &table("t")).unwrap();
        assert_eq!(report.issues_of_type("unexpected_negatives").count(), 0);
    }

    #[test]
    fn test_missing_table_is_backend_error() {
        let registry = SourceRegistry::new().unwrap();
        let err = QualityScanner::with_defaults()
            .scan(&registry, &table("missing"))
            .unwrap_err();
        assert_eq!(err.kind(), "BackendError");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let registry = registry("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (1);");
        let mut config = QualityConfig::default();
        config.high_null_rate_threshold = 0.01;
        let err = QualityScanner::new(config)
            .scan(&registry, &table("t"))
            .unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }
}
