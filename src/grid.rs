use crate::error::{Result, WaterfallError};
use serde::{Deserialize, Serialize};

/// An untyped workbook cell. `Text` preserves the source string exactly as
/// the reader produced it; period resolution depends on that original form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Empty, or text that is nothing but whitespace.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// The textual form used for period parsing: the trimmed source string
    /// for text cells, the shortest-roundtrip rendering for numeric cells.
    pub fn source_form(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => {
                let t = s.trim();
                (!t.is_empty()).then(|| t.to_string())
            }
            CellValue::Number(n) => Some(format!("{}", n)),
            CellValue::Empty => None,
        }
    }

    /// Human-readable rendering for identifier and dimension cells.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => format!("{}", n),
            CellValue::Empty => String::new(),
        }
    }

    /// Interpret the cell as an integer entity key, if it is one.
    pub fn as_integer_key(&self) -> Option<i64> {
        match self {
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i64),
            CellValue::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }
}

/// A materialized worksheet: ordered column labels, a header row (row 0)
/// carrying section titles and period values, and data rows below it.
///
/// Column order is significant and is the sole basis for section and period
/// mapping; labels are not assumed unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Grid {
    /// Build a grid from the reader's output. Ragged rows are padded with
    /// `Empty` (or truncated) to the column-list width.
    pub fn new(columns: Vec<String>, mut rows: Vec<Vec<CellValue>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(WaterfallError::EmptyGrid);
        }
        if rows.is_empty() {
            return Err(WaterfallError::MissingHeaderRow);
        }

        let width = columns.len();
        for row in &mut rows {
            row.resize(width, CellValue::Empty);
        }

        Ok(Self { columns, rows })
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row 0: the header row beneath the column labels.
    pub fn header(&self) -> &[CellValue] {
        &self.rows[0]
    }

    pub fn header_cell(&self, col: usize) -> &CellValue {
        &self.rows[0][col]
    }

    /// Everything below the header row.
    pub fn data_rows(&self) -> &[Vec<CellValue>] {
        &self.rows[1..]
    }

    /// Count of non-empty cells in a column over the data rows only.
    pub fn non_empty_count(&self, col: usize) -> usize {
        self.data_rows()
            .iter()
            .filter(|row| !row[col].is_empty())
            .count()
    }
}
