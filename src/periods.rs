use crate::error::{Result, WaterfallError};
use crate::grid::{CellValue, Grid};
use crate::schema::YearRange;
use crate::utils::{last_day_of_month, shift_month};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A canonical calendar period: one (year, month) pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn from_ym_opt(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Zero-padded `YYYY_MM` token.
    pub fn token(&self) -> String {
        format!("{:04}_{:02}", self.year, self.month)
    }

    /// The last calendar day of the period's month.
    pub fn month_end(&self) -> NaiveDate {
        last_day_of_month(self.year, self.month)
    }

    pub fn minus_months(&self, n: u32) -> Period {
        let (year, month) = shift_month(self.year, self.month, -(n as i32));
        Period { year, month }
    }

    /// `count` consecutive periods starting at `self`.
    pub fn sequence(&self, count: usize) -> Vec<Period> {
        (0..count as i32)
            .map(|i| {
                let (year, month) = shift_month(self.year, self.month, i);
                Period { year, month }
            })
            .collect()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonthParse {
    Exact(u32),
    /// A one-digit month segment whose trailing zero may have been dropped
    /// by numeric normalization: both readings are calendar-valid.
    Ambiguous { low: u32, high: u32 },
}

/// A header cell that passed the strict period parser but whose month may
/// still need an anchor to pin down.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodCandidate {
    year: i32,
    month: MonthParse,
    source: String,
}

impl PeriodCandidate {
    /// Parse a header-row cell against the plausible-year range.
    ///
    /// Accepts `YYYY.MM` textual/decimal forms (the month digits taken
    /// verbatim, preserving a leading zero present in the source) and bare
    /// numeric years as a month-ambiguous fallback. Anything else is not a
    /// period column.
    pub fn parse(cell: &CellValue, years: YearRange) -> Option<Self> {
        let source = cell.source_form()?;

        let (year_text, month_text) = match source.split_once('.') {
            Some((y, m)) => (y, m),
            None => (source.as_str(), "1"),
        };

        let year: i32 = year_text.parse().ok()?;
        if !years.contains(year) {
            return None;
        }
        if month_text.is_empty()
            || month_text.len() > 2
            || !month_text.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let month = if month_text.len() == 2 {
            let m: u32 = month_text.parse().ok()?;
            (1..=12).contains(&m).then_some(MonthParse::Exact(m))?
        } else {
            let d: u32 = month_text.parse().ok()?;
            match ((1..=12).contains(&d), (1..=12).contains(&(d * 10))) {
                (true, true) => MonthParse::Ambiguous { low: d, high: d * 10 },
                (true, false) => MonthParse::Exact(d),
                (false, true) => MonthParse::Exact(d * 10),
                (false, false) => return None,
            }
        };

        Some(Self {
            year,
            month,
            source,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Resolve to a concrete period. `expected` is the chronological anchor
    /// context: the period this cell is expected to be (derived by the caller
    /// from the window's known end). An ambiguous month with no anchor is an
    /// error, never a guess; an anchor that contradicts the cell is too.
    pub fn resolve(&self, expected: Option<Period>) -> Result<Period> {
        match self.month {
            MonthParse::Exact(month) => Ok(Period {
                year: self.year,
                month,
            }),
            MonthParse::Ambiguous { low, high } => match expected {
                Some(e) if e.year == self.year && (e.month == low || e.month == high) => Ok(e),
                Some(e) => Err(WaterfallError::AnchorMismatch {
                    text: self.source.clone(),
                    anchor: e.token(),
                }),
                None => Err(WaterfallError::AmbiguousPeriod {
                    text: self.source.clone(),
                }),
            },
        }
    }
}

/// Period Column Detector: the ordered column indices within `[start, end)`
/// whose header-row cell passes the period parser. Non-conforming columns
/// (titles, filters, a trailing "Total") are skipped without ending the scan.
pub fn detect_period_columns(grid: &Grid, start: usize, end: usize, years: YearRange) -> Vec<usize> {
    (start..end)
        .filter(|&col| PeriodCandidate::parse(grid.header_cell(col), years).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEARS: YearRange = YearRange { min: 2017, max: 2030 };

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_two_digit_months_resolve_directly() {
        let c = PeriodCandidate::parse(&text("2025.01"), YEARS).unwrap();
        assert_eq!(c.resolve(None).unwrap(), Period::from_ym_opt(2025, 1).unwrap());

        let c = PeriodCandidate::parse(&text("2025.10"), YEARS).unwrap();
        assert_eq!(c.resolve(None).unwrap(), Period::from_ym_opt(2025, 10).unwrap());

        let c = PeriodCandidate::parse(&text("2025.12"), YEARS).unwrap();
        assert_eq!(c.resolve(None).unwrap(), Period::from_ym_opt(2025, 12).unwrap());
    }

    #[test]
    fn test_single_digit_month_with_one_valid_reading() {
        // "3" could only be March; 30 is not a month.
        let c = PeriodCandidate::parse(&text("2025.3"), YEARS).unwrap();
        assert_eq!(c.resolve(None).unwrap(), Period::from_ym_opt(2025, 3).unwrap());
    }

    #[test]
    fn test_ambiguous_month_requires_anchor() {
        // "2025.1" is January or October after float normalization.
        let c = PeriodCandidate::parse(&CellValue::Number(2025.1), YEARS).unwrap();
        assert_eq!(c.source(), "2025.1");

        let err = c.resolve(None).unwrap_err();
        assert!(matches!(err, WaterfallError::AmbiguousPeriod { .. }));

        // Anchor context: first period of a window ending at 2025.12.
        let expected = Period::from_ym_opt(2025, 12).unwrap().minus_months(11);
        assert_eq!(
            c.resolve(Some(expected)).unwrap(),
            Period::from_ym_opt(2025, 1).unwrap()
        );

        // An anchor pointing at a month the cell cannot mean is rejected.
        let wrong = Period::from_ym_opt(2025, 5).unwrap();
        assert!(matches!(
            c.resolve(Some(wrong)),
            Err(WaterfallError::AnchorMismatch { .. })
        ));
    }

    #[test]
    fn test_bare_year_is_month_ambiguous() {
        let c = PeriodCandidate::parse(&CellValue::Number(2024.0), YEARS).unwrap();
        assert!(matches!(
            c.resolve(None),
            Err(WaterfallError::AmbiguousPeriod { .. })
        ));
    }

    #[test]
    fn test_non_periods_are_rejected() {
        assert!(PeriodCandidate::parse(&text("Total"), YEARS).is_none());
        assert!(PeriodCandidate::parse(&text("1999.01"), YEARS).is_none());
        assert!(PeriodCandidate::parse(&text("2025.13"), YEARS).is_none());
        assert!(PeriodCandidate::parse(&text("2025.0"), YEARS).is_none());
        assert!(PeriodCandidate::parse(&text("2025.015"), YEARS).is_none());
        assert!(PeriodCandidate::parse(&CellValue::Empty, YEARS).is_none());
    }

    #[test]
    fn test_token_and_month_end() {
        let p = Period::from_ym_opt(2024, 2).unwrap();
        assert_eq!(p.token(), "2024_02");
        assert_eq!(p.month_end(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let p = Period::from_ym_opt(2025, 2).unwrap();
        assert_eq!(p.month_end(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[test]
    fn test_sequence_crosses_year_boundary() {
        let start = Period::from_ym_opt(2024, 12).unwrap();
        let seq = start.sequence(3);
        let tokens: Vec<String> = seq.iter().map(Period::token).collect();
        assert_eq!(tokens, vec!["2024_12", "2025_01", "2025_02"]);
    }
}
