//! Routes tool calls to the core library.

use crate::{SourceSpec, ToolCall};
use detective_core::explore::{self, DEFAULT_QUERY_LIMIT};
use detective_core::quality::{AnomalyConfig, AnomalyDetector, QualityScanner, compare_schemas};
use detective_core::{Profiler, Result, SourceRegistry, TableRef, summarize};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// A registry plus the analysis components shared by every call.
pub struct Session {
    registry: SourceRegistry,
    scanner: QualityScanner,
    profiler: Profiler,
    query_limit: usize,
}

impl Session {
    /// Opens a session with an empty registry.
    ///
    /// # Errors
    /// Returns `DetectiveError::Backend` if DuckDB cannot be initialized.
    pub fn new(query_limit: usize) -> Result<Self> {
        Ok(Self {
            registry: SourceRegistry::new()?,
            scanner: QualityScanner::with_defaults(),
            profiler: Profiler::with_defaults(),
            query_limit,
        })
    }

    /// A session with the default query limit.
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_QUERY_LIMIT)
    }

    /// Sources connected in this session.
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Row cap applied to ad-hoc queries without their own limit.
    pub fn query_limit(&self) -> usize {
        self.query_limit
    }

    /// Connects each source in order, stopping at the first failure.
    pub fn connect_all(&mut self, specs: &[SourceSpec]) -> Result<()> {
        for spec in specs {
            self.registry
                .connect(&spec.name, spec.source_type, &spec.path)?;
        }
        Ok(())
    }

    /// Runs one tool call and returns its report as JSON.
    pub fn dispatch(&mut self, call: &ToolCall) -> Result<JsonValue> {
        tracing::debug!(?call, "Dispatching tool call");
        match call {
            ToolCall::Connect {
                name,
                source_type,
                path,
            } => to_json(&explore::connect_source(
                &mut self.registry,
                name,
                source_type,
                path,
            )?),
            ToolCall::Disconnect { name } => {
                to_json(&explore::disconnect_source(&mut self.registry, name)?)
            }
            ToolCall::Sources => to_json(&explore::list_sources(&self.registry)),
            ToolCall::Tables => to_json(&explore::list_tables(&self.registry)),
            ToolCall::Schema { table, source } => {
                let table = TableRef::new(table, source.as_deref())?;
                to_json(&explore::table_schema(&self.registry, &table)?)
            }
            ToolCall::Query { sql, limit } => to_json(&explore::run_query(
                &self.registry,
                sql,
                limit.unwrap_or(self.query_limit),
            )?),
            ToolCall::Sample { table, n, source } => {
                let table = TableRef::new(table, source.as_deref())?;
                to_json(&explore::sample_table(&self.registry, &table, *n)?)
            }
            ToolCall::Profile { table, source } => {
                let table = TableRef::new(table, source.as_deref())?;
                to_json(&self.profiler.profile(&self.registry, &table)?)
            }
            ToolCall::Summarize => to_json(&summarize(&self.registry)),
            ToolCall::Scan { table, source } => {
                let table = TableRef::new(table, source.as_deref())?;
                to_json(&self.scanner.scan(&self.registry, &table)?)
            }
            ToolCall::Anomalies {
                table,
                column,
                time_column,
                z_threshold,
                sensitivity,
                source,
            } => {
                let table = TableRef::new(table, source.as_deref())?;
                let mut config = AnomalyConfig::new();
                if let Some(sensitivity) = sensitivity {
                    config = config.with_sensitivity(*sensitivity);
                }
                if let Some(z) = z_threshold {
                    config = config.with_z_threshold(*z);
                }
                let detector = AnomalyDetector::new(config);
                to_json(&detector.detect(
                    &self.registry,
                    &table,
                    column,
                    time_column.as_deref(),
                )?)
            }
            ToolCall::Compare {
                table_a,
                table_b,
                source_a,
                source_b,
            } => {
                let a = TableRef::new(table_a, source_a.as_deref())?;
                let b = TableRef::new(table_b, source_b.as_deref())?;
                to_json(&compare_schemas(&self.registry, &a, &b)?)
            }
            ToolCall::Export {
                sql,
                output_path,
                format,
            } => to_json(&explore::export_data(
                &self.registry,
                sql,
                output_path,
                format,
            )?),
        }
    }
}

fn to_json<T: Serialize>(report: &T) -> Result<JsonValue> {
    Ok(serde_json::to_value(report)?)
}
