use crate::error::{Result, WaterfallError};
use crate::grid::{CellValue, Grid};
use log::debug;

/// A contiguous half-open column range `[start, end)` holding one metric
/// block, introduced by its sentinel header label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRange {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// Header Classifier: locate each sentinel label in the header row and derive
/// the implicit section ends.
///
/// Labels are matched by exact case-sensitive equality against the header-row
/// cell, not the column's own label; column labels may be synthetic. A
/// missing required label is a structural error. `terminators` close the
/// preceding section without starting one and are optional.
pub fn locate_sections(
    grid: &Grid,
    labels: &[String],
    terminators: &[String],
) -> Result<Vec<SectionRange>> {
    let find_first = |needle: &str| -> Option<usize> {
        grid.header().iter().position(|cell| match cell {
            CellValue::Text(s) => s == needle,
            _ => false,
        })
    };

    let mut starts = Vec::with_capacity(labels.len());
    for label in labels {
        let start = find_first(label).ok_or_else(|| WaterfallError::SectionNotFound(label.clone()))?;
        debug!("section '{}' starts at column {}", label, start);
        starts.push((label.clone(), start));
    }

    let mut boundaries: Vec<usize> = starts.iter().map(|(_, s)| *s).collect();
    boundaries.extend(terminators.iter().filter_map(|t| find_first(t)));
    boundaries.sort_unstable();

    starts.sort_by_key(|(_, s)| *s);

    Ok(starts
        .into_iter()
        .map(|(label, start)| {
            let end = boundaries
                .iter()
                .copied()
                .find(|&b| b > start)
                .unwrap_or_else(|| grid.width());
            SectionRange { label, start, end }
        })
        .collect())
}
