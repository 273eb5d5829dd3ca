//! Column-level schema comparison.

use super::models::{ColumnType, SchemaDiff, TypeChange};
use crate::Result;
use crate::backend::QueryBackend;
use crate::models::{ColumnSchema, TableRef};
use std::collections::BTreeMap;

/// Compares the schemas of two tables by column name.
///
/// Lists in the result are sorted by column name; `identical` is true
/// only when all three are empty.
///
/// # Errors
/// Returns `DetectiveError::Backend` if either table cannot be described.
pub fn compare_schemas(
    backend: &dyn QueryBackend,
    table_a: &TableRef,
    table_b: &TableRef,
) -> Result<SchemaDiff> {
    let schema_a = backend.schema(table_a)?;
    let schema_b = backend.schema(table_b)?;
    let diff = diff_schemas(table_a.to_string(), table_b.to_string(), &schema_a, &schema_b);

    tracing::info!(
        table_a = %table_a,
        table_b = %table_b,
        differences = diff.diff_count,
        "Schema comparison complete"
    );
    Ok(diff)
}

/// Diffs two already-resolved schemas.
pub fn diff_schemas(
    table_a: String,
    table_b: String,
    schema_a: &[ColumnSchema],
    schema_b: &[ColumnSchema],
) -> SchemaDiff {
    let types_a: BTreeMap<&str, &str> = schema_a
        .iter()
        .map(|c| (c.column.as_str(), c.data_type.as_str()))
        .collect();
    let types_b: BTreeMap<&str, &str> = schema_b
        .iter()
        .map(|c| (c.column.as_str(), c.data_type.as_str()))
        .collect();

    let only_in = |left: &BTreeMap<&str, &str>, right: &BTreeMap<&str, &str>| -> Vec<ColumnType> {
        left.iter()
            .filter(|(column, _)| !right.contains_key(*column))
            .map(|(column, data_type)| ColumnType {
                column: column.to_string(),
                data_type: data_type.to_string(),
            })
            .collect()
    };
    let columns_added_in_b = only_in(&types_b, &types_a);
    let columns_removed_in_b = only_in(&types_a, &types_b);

    let type_changes: Vec<TypeChange> = types_a
        .iter()
        .filter_map(|(column, type_a)| {
            let type_b = types_b.get(column)?;
            (type_a != type_b).then(|| TypeChange {
                column: column.to_string(),
                type_a: type_a.to_string(),
                type_b: type_b.to_string(),
            })
        })
        .collect();

    let diff_count = columns_added_in_b
        .len()
        .saturating_add(columns_removed_in_b.len())
        .saturating_add(type_changes.len());
    SchemaDiff {
        table_a,
        table_b,
        identical: diff_count == 0,
        columns_added_in_b,
        columns_removed_in_b,
        type_changes,
        diff_count,
    }
}
