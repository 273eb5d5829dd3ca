//! Exploration tool integration tests.
//!
//! This test suite covers:
//! - Ad-hoc queries with and without a row cap
//! - Sampling
//! - Listing sources and tables
//! - Export to Parquet and CSV, including argument errors

use detective_core::explore::{
    DEFAULT_QUERY_LIMIT, ExportFormat, connect_source, disconnect_source, export_data,
    list_sources, list_tables, run_query, sample_table, table_schema,
};
use detective_core::{Result, SourceRegistry, SourceType, TableRef};
use std::fs;
use tempfile::TempDir;

fn numbers_registry() -> SourceRegistry {
    let registry = SourceRegistry::new().expect("in-memory DuckDB");
    registry
        .connection()
        .execute_batch("CREATE TABLE numbers AS SELECT range AS n FROM range(50);")
        .expect("fixture SQL should run");
    registry
}

// =============================================================================
// Queries and samples
// =============================================================================

#[test]
fn test_run_query_applies_row_cap() -> Result<()> {
    let registry = numbers_registry();
    let rows = run_query(&registry, "SELECT n FROM numbers ORDER BY n;", 5)?;
    assert_eq!(rows.row_count, 5);
    assert_eq!(rows.rows[4]["n"], 4);
    assert!(rows.table.is_none());
    Ok(())
}

#[test]
fn test_run_query_keeps_explicit_limit() -> Result<()> {
    let registry = numbers_registry();
    let rows = run_query(&registry, "SELECT n FROM numbers LIMIT 20", 5)?;
    assert_eq!(rows.row_count, 20);

    let all = run_query(&registry, "SELECT n FROM numbers", DEFAULT_QUERY_LIMIT)?;
    assert_eq!(all.row_count, 50);
    Ok(())
}

#[test]
fn test_run_query_with_leading_comment_keeps_limit() -> Result<()> {
    let registry = numbers_registry();
    let rows = run_query(&registry, "-- top rows\nSELECT n FROM numbers LIMIT 5", 1000)?;
    assert_eq!(rows.row_count, 5);
    Ok(())
}

#[test]
fn test_run_query_reports_backend_error() -> Result<()> {
    let registry = numbers_registry();
    let err = run_query(&registry, "SELEC n FROM numbers", 5).unwrap_err();
    assert_eq!(err.kind(), "BackendError");
    Ok(())
}

#[test]
fn test_sample_table() -> Result<()> {
    let registry = numbers_registry();
    let sample = sample_table(&registry, &TableRef::new("numbers", None)?, 10)?;
    assert_eq!(sample.table.as_deref(), Some("numbers"));
    assert_eq!(sample.columns, vec!["n"]);
    assert_eq!(sample.row_count, 10);

    let oversized = sample_table(&registry, &TableRef::new("numbers", None)?, 500)?;
    assert_eq!(oversized.row_count, 50);
    Ok(())
}

#[test]
fn test_table_schema() -> Result<()> {
    let registry = numbers_registry();
    let schema = table_schema(&registry, &TableRef::new("numbers", None)?)?;
    assert_eq!(schema.table, "numbers");
    assert_eq!(schema.column_count, 1);
    assert_eq!(schema.columns[0].data_type, "BIGINT");
    Ok(())
}

// =============================================================================
// Source tools
// =============================================================================

#[test]
fn test_connect_list_and_disconnect() -> Result<()> {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("cities.csv");
    fs::write(&path, "city,pop\nOslo,700\nLima,9000\n").expect("write csv");

    let mut registry = SourceRegistry::new()?;
    let report = connect_source(&mut registry, "cities", "CSV", &path.to_string_lossy())?;
    assert_eq!(report.status, "connected");
    assert_eq!(report.source_type, SourceType::Csv);
    assert_eq!(report.table_count, 1);

    let sources = list_sources(&registry);
    assert_eq!(sources.total_sources, 1);
    assert_eq!(sources.total_tables, 1);

    let tables = list_tables(&registry);
    assert_eq!(tables.count, 1);
    assert_eq!(tables.tables[0].source, "cities");
    assert_eq!(tables.tables[0].table, "cities");

    let value = serde_json::to_value(&tables).expect("listing serializes");
    assert_eq!(value["tables"][0]["type"], "csv");

    let removed = disconnect_source(&mut registry, "cities")?;
    assert_eq!(removed.status, "disconnected");
    assert_eq!(list_tables(&registry).count, 0);
    Ok(())
}

#[test]
fn test_connect_unknown_type_is_invalid_input() -> Result<()> {
    let mut registry = SourceRegistry::new()?;
    let err = connect_source(&mut registry, "x", "excel", "/tmp/x.xlsx").unwrap_err();
    assert!(err.is_invalid_input());
    assert_eq!(registry.source_count(), 0);
    Ok(())
}

// =============================================================================
// Export
// =============================================================================

#[test]
fn test_export_parquet_into_nested_directory() -> Result<()> {
    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("nested").join("deeper").join("evens.parquet");
    let registry = numbers_registry();

    let report = export_data(
        &registry,
        "SELECT n FROM numbers WHERE n % 2 = 0;",
        &out.to_string_lossy(),
        "parquet",
    )?;

    assert_eq!(report.status, "exported");
    assert_eq!(report.format, ExportFormat::Parquet);
    assert_eq!(report.row_count, 25);
    assert!(report.file_size_bytes > 0);
    assert!(out.exists());

    let reread = run_query(
        &registry,
        &format!("SELECT COUNT(*) AS c FROM read_parquet('{}')", out.display()),
        10,
    )?;
    assert_eq!(reread.rows[0]["c"], 25);
    Ok(())
}

#[test]
fn test_export_csv_has_header() -> Result<()> {
    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("first.csv");
    let registry = numbers_registry();

    let report = export_data(
        &registry,
        "SELECT n FROM numbers ORDER BY n LIMIT 3",
        &out.to_string_lossy(),
        "csv",
    )?;
    assert_eq!(report.row_count, 3);

    let text = fs::read_to_string(&out).expect("read export");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines, vec!["n", "0", "1", "2"]);
    Ok(())
}

#[test]
fn test_export_rejects_bad_arguments() -> Result<()> {
    let dir = TempDir::new().expect("temp dir");
    let registry = numbers_registry();

    let err = export_data(
        &registry,
        "SELECT 1",
        &dir.path().join("out.json").to_string_lossy(),
        "json",
    )
    .unwrap_err();
    assert!(err.is_invalid_input());

    let unsafe_path = format!("{}/out';--.csv", dir.path().display());
    let err = export_data(&registry, "SELECT 1", &unsafe_path, "csv").unwrap_err();
    assert!(err.is_invalid_input());
    Ok(())
}
