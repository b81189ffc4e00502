use log::warn;

/// The reference section's selected trailing window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSelection {
    /// Grid column indices, in chronological (original column) order.
    pub columns: Vec<usize>,
    /// 0-based position of the first selected column within the section's
    /// full candidate list. 0 when no column qualified.
    pub offset: usize,
    /// True when fewer than the requested number of columns qualified.
    pub degraded: bool,
}

/// Trailing-Window Selector: of the candidate period columns, keep those with
/// enough non-empty data cells, then take the most recent `size`.
///
/// Pure function of its inputs. `counts` is parallel to `candidates`.
pub fn select_trailing_window(
    candidates: &[usize],
    counts: &[usize],
    threshold: usize,
    size: usize,
) -> WindowSelection {
    debug_assert_eq!(candidates.len(), counts.len());

    let qualifying: Vec<usize> = (0..candidates.len())
        .filter(|&pos| counts[pos] >= threshold)
        .collect();

    let skip = qualifying.len().saturating_sub(size);
    let selected = &qualifying[skip..];

    let degraded = qualifying.len() < size;
    if degraded {
        warn!(
            "only {} of {} requested period columns meet the density threshold {}",
            qualifying.len(),
            size,
            threshold
        );
    }

    WindowSelection {
        columns: selected.iter().map(|&pos| candidates[pos]).collect(),
        offset: selected.first().copied().unwrap_or(0),
        degraded,
    }
}

/// A non-reference section's window, derived from the reference offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedWindow {
    pub columns: Vec<usize>,
    /// True when the section could not supply the full window length.
    pub truncated: bool,
}

/// Cross-Section Aligner: apply the reference window's relative offset and
/// length to another section's candidate list. All sections are expected to
/// share period ordering and cardinality; when one falls short the window is
/// truncated rather than failing the run.
pub fn align_section(candidates: &[usize], offset: usize, len: usize) -> AlignedWindow {
    let start = offset.min(candidates.len());
    let end = (offset + len).min(candidates.len());

    AlignedWindow {
        columns: candidates[start..end].to_vec(),
        truncated: end - start < len,
    }
}
