//! # Waterfall Pivot
//!
//! A library for resolving period-indexed column sections in wide ARR
//! waterfall exports and reshaping them into long-format monthly tables.
//!
//! ## Core Concepts
//!
//! - **Grid**: an untyped 2-D worksheet (ordered columns, header row, data
//!   rows) produced by an external workbook reader
//! - **Section**: a contiguous block of columns holding one metric, one
//!   column per calendar month, introduced by a sentinel header label
//! - **Reference section**: the section whose data density selects the
//!   trailing window of periods for every section
//! - **Trailing window**: the most recent N periods (default 12) that
//!   actually carry data
//! - **Join key**: `entity_id + separator + dimension`, enabling correlation
//!   of records across the output tables
//!
//! ## Example
//!
//! ```rust,ignore
//! use waterfall_pivot::*;
//!
//! let grid = Grid::new(columns, rows)?;
//!
//! let mut config = EngineConfig::new(
//!     vec![
//!         SectionSpec {
//!             label: "ARR by Period by Product".to_string(),
//!             metric: "ARR".to_string(),
//!             kind: MetricKind::Numeric,
//!             empty_cells: EmptyCellPolicy::Drop,
//!         },
//!         SectionSpec {
//!             label: "Net Change Reason by Period".to_string(),
//!             metric: "ChangeReason".to_string(),
//!             kind: MetricKind::Categorical,
//!             empty_cells: EmptyCellPolicy::Keep,
//!         },
//!     ],
//!     IdentifierColumns { entity_id: 0, entity_name: 1, dimension: 35 },
//! );
//! config.terminator_labels = vec!["Net Change Filters".to_string()];
//! config.anchor = Period::from_ym_opt(2025, 11);
//!
//! let outcome = process_waterfall_grid(&grid, &config)?;
//! for table in &outcome.tables {
//!     println!("{}: {} records", table.metric, table.records.len());
//! }
//! ```

pub mod engine;
pub mod error;
pub mod grid;
pub mod periods;
pub mod pivot;
pub mod schema;
pub mod sections;
pub mod utils;
pub mod window;

pub use engine::{LayoutResolver, ResolvedLayout, ResolvedSection};
pub use error::{Diagnostic, Result, WaterfallError};
pub use grid::{CellValue, Grid};
pub use periods::{detect_period_columns, Period, PeriodCandidate};
pub use pivot::{collect_entity_rows, pivot_section, EntityRow};
pub use schema::*;
pub use sections::{locate_sections, SectionRange};
pub use utils::*;
pub use window::{align_section, select_trailing_window, AlignedWindow, WindowSelection};

use log::{info, warn};

/// Everything one invocation produces: the pivoted tables in section order,
/// the recoverable conditions encountered, and the dropped-row audit count.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotOutcome {
    pub tables: Vec<PivotTable>,
    pub diagnostics: Vec<Diagnostic>,
    pub skipped_rows: usize,
}

pub struct WaterfallProcessor;

impl WaterfallProcessor {
    pub fn process(grid: &Grid, config: &EngineConfig) -> Result<PivotOutcome> {
        config.validate()?;
        validate_identifier_bounds(config, grid)?;

        info!(
            "processing grid: {} columns, {} data rows, {} sections",
            grid.width(),
            grid.data_rows().len(),
            config.sections.len()
        );

        let layout = LayoutResolver::new(config).resolve(grid)?;
        let mut diagnostics = layout.diagnostics.clone();

        let (entity_rows, skipped_rows) =
            collect_entity_rows(grid, &config.identifiers, &config.join_key_separator);
        if skipped_rows > 0 {
            diagnostics.push(Diagnostic::RowsSkipped {
                count: skipped_rows,
            });
        }

        for diagnostic in &diagnostics {
            warn!("{}", diagnostic);
        }

        let tables = layout
            .sections
            .iter()
            .map(|section| PivotTable {
                label: section.spec.label.clone(),
                metric: section.spec.metric.clone(),
                records: pivot_section(
                    grid,
                    &entity_rows,
                    &section.columns,
                    &section.periods,
                    &section.spec,
                    &config.sentinel_replacements,
                    config.period_format,
                ),
            })
            .collect();

        Ok(PivotOutcome {
            tables,
            diagnostics,
            skipped_rows,
        })
    }
}

pub fn process_waterfall_grid(grid: &Grid, config: &EngineConfig) -> Result<PivotOutcome> {
    WaterfallProcessor::process(grid, config)
}

fn validate_identifier_bounds(config: &EngineConfig, grid: &Grid) -> Result<()> {
    let ids = &config.identifiers;
    for (name, col) in [
        ("entity_id", ids.entity_id),
        ("entity_name", ids.entity_name),
        ("dimension", ids.dimension),
    ] {
        if col >= grid.width() {
            return Err(WaterfallError::InvalidConfig(format!(
                "{} column {} is outside the grid (width {})",
                name,
                col,
                grid.width()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    /// A miniature export: identifiers, an ARR section and a reason section,
    /// both three periods wide, plus a trailing filter block.
    fn mini_export() -> Grid {
        let header = vec![
            text("SF #"),
            text("Customer Name"),
            text("Product"),
            text("ARR by Period by Product"),
            text("2025.01"),
            text("2025.02"),
            text("2025.03"),
            text("Net Change Reason by Period"),
            text("2025.01"),
            text("2025.02"),
            text("2025.03"),
            text("Net Change Filters"),
            text("some filter"),
        ];
        let row1 = vec![
            num(101.0),
            text("Acme"),
            text("Analytics"),
            CellValue::Empty,
            num(0.0),
            num(1200.0),
            num(1300.0),
            CellValue::Empty,
            text("-"),
            text("Upsell"),
            text("-"),
            CellValue::Empty,
            CellValue::Empty,
        ];
        let row2 = vec![
            text("not a number"),
            text("Junk"),
            text("Junk"),
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
        ];
        let columns = (0..header.len()).map(|i| format!("c{}", i)).collect();
        Grid::new(columns, vec![header, row1, row2]).unwrap()
    }

    fn mini_config() -> EngineConfig {
        let mut config = EngineConfig::new(
            vec![
                SectionSpec {
                    label: "ARR by Period by Product".to_string(),
                    metric: "ARR".to_string(),
                    kind: MetricKind::Numeric,
                    empty_cells: EmptyCellPolicy::Drop,
                },
                SectionSpec {
                    label: "Net Change Reason by Period".to_string(),
                    metric: "ChangeReason".to_string(),
                    kind: MetricKind::Categorical,
                    empty_cells: EmptyCellPolicy::Keep,
                },
            ],
            IdentifierColumns {
                entity_id: 0,
                entity_name: 1,
                dimension: 2,
            },
        );
        config.terminator_labels = vec!["Net Change Filters".to_string()];
        config.min_density = 1;
        config.window_size = 3;
        config
    }

    #[test]
    fn test_end_to_end_processing() {
        let grid = mini_export();
        let outcome = process_waterfall_grid(&grid, &mini_config()).unwrap();

        assert_eq!(outcome.tables.len(), 2);
        assert_eq!(outcome.skipped_rows, 1);

        let arr = &outcome.tables[0];
        assert_eq!(arr.metric, "ARR");
        assert_eq!(arr.records.len(), 3);
        assert_eq!(arr.records[0].join_key, "101_Analytics");
        assert_eq!(arr.records[0].period, "2025_01");
        assert_eq!(arr.records[0].value, CellValue::Number(0.0));

        let reasons = &outcome.tables[1];
        assert_eq!(reasons.records.len(), 3);
        assert_eq!(
            reasons.records[0].value,
            CellValue::Text("No Change".to_string())
        );
        assert_eq!(
            reasons.records[1].value,
            CellValue::Text("Upsell".to_string())
        );
    }

    #[test]
    fn test_missing_section_fails_without_partial_output() {
        let grid = mini_export();
        let mut config = mini_config();
        config.sections[1].label = "Not In This Export".to_string();

        let err = process_waterfall_grid(&grid, &config).unwrap_err();
        assert!(matches!(err, WaterfallError::SectionNotFound(_)));
    }

    #[test]
    fn test_identifier_bounds_are_checked() {
        let grid = mini_export();
        let mut config = mini_config();
        config.identifiers.dimension = 99;

        let err = process_waterfall_grid(&grid, &config).unwrap_err();
        assert!(matches!(err, WaterfallError::InvalidConfig(_)));
    }
}
