use crate::error::{Diagnostic, Result, WaterfallError};
use crate::grid::Grid;
use crate::periods::{detect_period_columns, Period, PeriodCandidate};
use crate::schema::{EngineConfig, SectionSpec};
use crate::sections::locate_sections;
use crate::window::{align_section, select_trailing_window};
use log::{debug, info};

/// One section's share of the resolved layout: the grid columns to reshape
/// and the canonical period each column carries. `columns` and `periods` are
/// parallel and equally long.
#[derive(Debug, Clone)]
pub struct ResolvedSection {
    pub spec: SectionSpec,
    pub columns: Vec<usize>,
    pub periods: Vec<Period>,
}

#[derive(Debug, Clone)]
pub struct ResolvedLayout {
    pub sections: Vec<ResolvedSection>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolves a grid's column layout into per-section trailing windows:
/// classify sections, detect period columns, select the reference window by
/// data density, pin down the window's calendar periods, and propagate the
/// window offset to every other section.
pub struct LayoutResolver<'a> {
    config: &'a EngineConfig,
}

impl<'a> LayoutResolver<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    pub fn resolve(&self, grid: &Grid) -> Result<ResolvedLayout> {
        let config = self.config;
        let mut diagnostics = Vec::new();

        let labels: Vec<String> = config.sections.iter().map(|s| s.label.clone()).collect();
        let ranges = locate_sections(grid, &labels, &config.terminator_labels)?;

        // Candidate period columns per configured section, config order.
        let candidates: Vec<Vec<usize>> = config
            .sections
            .iter()
            .map(|spec| {
                let range = ranges
                    .iter()
                    .find(|r| r.label == spec.label)
                    .expect("located sections cover every configured label");
                detect_period_columns(grid, range.start, range.end, config.year_range)
            })
            .collect();

        // The first configured section is the reference: its data density
        // governs the trailing window for everyone.
        let reference = &config.sections[0];
        let reference_candidates = &candidates[0];
        if reference_candidates.is_empty() {
            return Err(WaterfallError::NoPeriodColumns(reference.label.clone()));
        }

        let counts: Vec<usize> = reference_candidates
            .iter()
            .map(|&col| grid.non_empty_count(col))
            .collect();
        debug!(
            "reference section '{}': {} candidate columns, counts {:?}",
            reference.label,
            reference_candidates.len(),
            counts
        );

        let window = select_trailing_window(
            reference_candidates,
            &counts,
            config.min_density,
            config.window_size,
        );
        if window.degraded {
            diagnostics.push(Diagnostic::DegradedWindow {
                requested: config.window_size,
                actual: window.columns.len(),
            });
        }

        let periods = self.resolve_window_periods(grid, &window.columns)?;
        info!(
            "trailing window: {} periods at offset {} ({})",
            periods.len(),
            window.offset,
            periods
                .first()
                .zip(periods.last())
                .map(|(a, b)| format!("{} .. {}", a, b))
                .unwrap_or_else(|| "empty".to_string())
        );

        let mut sections = Vec::with_capacity(config.sections.len());
        for (spec, section_candidates) in config.sections.iter().zip(&candidates) {
            let is_reference = spec.label == reference.label;

            if !is_reference && section_candidates.len() != reference_candidates.len() {
                diagnostics.push(Diagnostic::SectionMismatch {
                    section: spec.label.clone(),
                    reference_count: reference_candidates.len(),
                    section_count: section_candidates.len(),
                });
            }

            let columns = if is_reference {
                window.columns.clone()
            } else {
                let aligned = align_section(section_candidates, window.offset, periods.len());
                if aligned.truncated {
                    diagnostics.push(Diagnostic::WindowTruncated {
                        section: spec.label.clone(),
                        expected: periods.len(),
                        actual: aligned.columns.len(),
                    });
                }
                aligned.columns
            };

            sections.push(ResolvedSection {
                spec: spec.clone(),
                periods: periods[..columns.len()].to_vec(),
                columns,
            });
        }

        Ok(ResolvedLayout {
            sections,
            diagnostics,
        })
    }

    /// Pin the window's calendar periods: resolve the first column's header
    /// cell (anchored when its compact encoding is ambiguous) and extend by
    /// consecutive months, which is the export's own layout invariant.
    fn resolve_window_periods(&self, grid: &Grid, columns: &[usize]) -> Result<Vec<Period>> {
        let first = match columns.first() {
            Some(&col) => col,
            None => return Ok(Vec::new()),
        };

        let cell = grid.header_cell(first);
        let candidate = PeriodCandidate::parse(cell, self.config.year_range).ok_or_else(|| {
            WaterfallError::UnparseablePeriod(cell.source_form().unwrap_or_default())
        })?;

        let expected = self
            .config
            .anchor
            .map(|anchor| anchor.minus_months(columns.len() as u32 - 1));

        let start = candidate.resolve(expected)?;
        Ok(start.sequence(columns.len()))
    }
}
