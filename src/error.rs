use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WaterfallError {
    #[error("Section sentinel label '{0}' not found in header row")]
    SectionNotFound(String),

    #[error("Grid has no header row")]
    MissingHeaderRow,

    #[error("Grid has no columns")]
    EmptyGrid,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Reference section '{0}' contains no valid period columns")]
    NoPeriodColumns(String),

    #[error("Period cell '{text}' has an ambiguous month segment and no anchor was configured")]
    AmbiguousPeriod { text: String },

    #[error("Period cell '{text}' is inconsistent with the configured anchor {anchor}")]
    AnchorMismatch { text: String, anchor: String },

    #[error("Cell '{0}' does not parse as a period")]
    UnparseablePeriod(String),
}

pub type Result<T> = std::result::Result<T, WaterfallError>;

/// Recoverable conditions accumulated during a run and returned beside the
/// result. None of these aborts processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// Fewer qualifying period columns than the configured window size.
    DegradedWindow { requested: usize, actual: usize },

    /// A non-reference section's candidate count differs from the reference.
    SectionMismatch {
        section: String,
        reference_count: usize,
        section_count: usize,
    },

    /// A non-reference section could not supply the full window at the
    /// computed offset; its output covers fewer periods.
    WindowTruncated {
        section: String,
        expected: usize,
        actual: usize,
    },

    /// Data rows dropped because the identifier cell was not a numeric key.
    RowsSkipped { count: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DegradedWindow { requested, actual } => write!(
                f,
                "only {} of {} requested period columns have sufficient data",
                actual, requested
            ),
            Diagnostic::SectionMismatch {
                section,
                reference_count,
                section_count,
            } => write!(
                f,
                "section '{}' has {} period columns where the reference has {}",
                section, section_count, reference_count
            ),
            Diagnostic::WindowTruncated {
                section,
                expected,
                actual,
            } => write!(
                f,
                "section '{}' window truncated to {} of {} periods",
                section, actual, expected
            ),
            Diagnostic::RowsSkipped { count } => {
                write!(f, "{} rows skipped (identifier not a numeric key)", count)
            }
        }
    }
}
