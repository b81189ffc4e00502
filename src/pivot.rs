use crate::grid::{CellValue, Grid};
use crate::periods::Period;
use crate::schema::{
    EmptyCellPolicy, IdentifierColumns, MetricKind, PeriodFormat, PivotRecord, SectionSpec,
};
use log::debug;
use std::collections::BTreeMap;

/// A data row that survived identifier filtering, with its synthesized join
/// key. Shared across every section's reshape.
#[derive(Debug, Clone)]
pub struct EntityRow {
    /// Index into `grid.data_rows()`.
    pub row: usize,
    pub entity_id: i64,
    pub entity_name: String,
    pub dimension: String,
    pub join_key: String,
}

/// Filter the grid's data rows to those with a parseable numeric entity key.
/// Returns the surviving rows and the count of dropped ones. A header-row
/// literal re-appearing as a data row falls out here.
pub fn collect_entity_rows(
    grid: &Grid,
    ids: &IdentifierColumns,
    separator: &str,
) -> (Vec<EntityRow>, usize) {
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (idx, row) in grid.data_rows().iter().enumerate() {
        let entity_id = match row[ids.entity_id].as_integer_key() {
            Some(id) => id,
            None => {
                skipped += 1;
                continue;
            }
        };

        let dimension = row[ids.dimension].display_text();
        rows.push(EntityRow {
            row: idx,
            entity_id,
            entity_name: row[ids.entity_name].display_text(),
            join_key: format!("{}{}{}", entity_id, separator, dimension),
            dimension,
        });
    }

    debug!(
        "{} entity rows collected, {} rows skipped",
        rows.len(),
        skipped
    );
    (rows, skipped)
}

/// Reshape one section from wide to long: one record per (entity row,
/// period) pair, subject to the section's empty-cell policy, with sentinel
/// normalization for categorical metrics. Output is sorted by
/// (entity_id, dimension, period) and is byte-stable across runs.
pub fn pivot_section(
    grid: &Grid,
    entity_rows: &[EntityRow],
    columns: &[usize],
    periods: &[Period],
    spec: &SectionSpec,
    replacements: &BTreeMap<String, String>,
    format: PeriodFormat,
) -> Vec<PivotRecord> {
    let mut records = Vec::new();

    for entity in entity_rows {
        let row = &grid.data_rows()[entity.row];

        for (&col, period) in columns.iter().zip(periods) {
            let cell = &row[col];
            if spec.empty_cells == EmptyCellPolicy::Drop && cell.is_empty() {
                continue;
            }

            let value = match (&spec.kind, cell) {
                (MetricKind::Categorical, CellValue::Text(s)) => match replacements.get(s) {
                    Some(replacement) => CellValue::Text(replacement.clone()),
                    None => cell.clone(),
                },
                _ => cell.clone(),
            };

            records.push(PivotRecord {
                join_key: entity.join_key.clone(),
                entity_id: entity.entity_id,
                entity_name: entity.entity_name.clone(),
                dimension: entity.dimension.clone(),
                period: format.render(*period),
                value,
            });
        }
    }

    records.sort_by(|a, b| {
        (a.entity_id, &a.dimension, &a.period).cmp(&(b.entity_id, &b.dimension, &b.period))
    });
    records
}
