use crate::error::{Result, WaterfallError};
use crate::grid::CellValue;
use crate::periods::Period;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum MetricKind {
    #[schemars(description = "Additive numeric metric (e.g. ARR, net change). Values pass through untouched.")]
    Numeric,

    #[schemars(
        description = "Categorical/reason metric carried as text. Sentinel replacements apply to these sections only."
    )]
    Categorical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum EmptyCellPolicy {
    #[schemars(
        description = "Emit a record only when the source cell is non-empty. Use for primary value metrics where an empty cell means the entity was not active in that period."
    )]
    Drop,

    #[schemars(
        description = "Emit a record for every entity/period pair regardless of cell emptiness. Use for auxiliary metrics that still require row presence."
    )]
    Keep,
}

/// One metric block of the export, identified by its sentinel header label.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SectionSpec {
    #[schemars(
        description = "Sentinel label marking the section's first column, matched case-sensitively against the header-row cell."
    )]
    pub label: String,

    #[schemars(description = "Name of the metric this section carries (used as the output table's value name).")]
    pub metric: String,

    pub kind: MetricKind,

    pub empty_cells: EmptyCellPolicy,
}

/// Positions of the identifier columns, counted from the left edge of the grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct IdentifierColumns {
    #[schemars(description = "Column holding the numeric entity/account key.")]
    pub entity_id: usize,

    #[schemars(description = "Column holding the human-readable entity name.")]
    pub entity_name: usize,

    #[schemars(description = "Column holding the secondary dimension (e.g. product).")]
    pub dimension: usize,
}

/// Inclusive bounds a header-row year must fall inside to count as a period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum PeriodFormat {
    #[schemars(description = "Render periods as zero-padded YYYY_MM tokens.")]
    Token,

    #[schemars(description = "Render periods as the last calendar day of the month, ISO formatted.")]
    MonthEndDate,
}

impl PeriodFormat {
    pub fn render(&self, period: Period) -> String {
        match self {
            PeriodFormat::Token => period.token(),
            PeriodFormat::MonthEndDate => period.month_end().format("%Y-%m-%d").to_string(),
        }
    }
}

/// The full configuration surface of the engine. Supplied by the caller; the
/// engine reads nothing from the environment.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EngineConfig {
    #[schemars(
        description = "Metric sections in column order. The first entry is the reference section whose data density selects the trailing window."
    )]
    pub sections: Vec<SectionSpec>,

    #[serde(default)]
    #[schemars(
        description = "Header labels that close the preceding section without starting a new one (e.g. a trailing filter block's title)."
    )]
    pub terminator_labels: Vec<String>,

    pub identifiers: IdentifierColumns,

    pub year_range: YearRange,

    #[schemars(
        description = "Minimum non-empty data cells a period column needs before it counts as carrying real data."
    )]
    pub min_density: usize,

    #[schemars(description = "Number of trailing periods to select. Defaults to 12.")]
    pub window_size: usize,

    #[schemars(
        description = "The calendar period the trailing window is expected to end at. Required to resolve period cells whose month segment lost a trailing zero; without it such cells are rejected rather than guessed."
    )]
    pub anchor: Option<Period>,

    #[schemars(
        description = "Exact-match text replacements applied to categorical sections (e.g. '-' -> 'No Change')."
    )]
    pub sentinel_replacements: BTreeMap<String, String>,

    #[schemars(
        description = "Separator between entity id and dimension in the join key. Collision-free as long as dimension values do not contain it; this is documented, not enforced."
    )]
    pub join_key_separator: String,

    pub period_format: PeriodFormat,
}

impl EngineConfig {
    /// Config with the conventional defaults for ARR waterfall exports:
    /// trailing 12 months, plausible years 2017-2030, density floor of 1000
    /// rows, `-` normalized to `No Change`.
    pub fn new(sections: Vec<SectionSpec>, identifiers: IdentifierColumns) -> Self {
        let mut sentinel_replacements = BTreeMap::new();
        sentinel_replacements.insert("-".to_string(), "No Change".to_string());

        Self {
            sections,
            terminator_labels: Vec::new(),
            identifiers,
            year_range: YearRange { min: 2017, max: 2030 },
            min_density: 1000,
            window_size: 12,
            anchor: None,
            sentinel_replacements,
            join_key_separator: "_".to_string(),
            period_format: PeriodFormat::Token,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sections.is_empty() {
            return Err(WaterfallError::InvalidConfig(
                "at least one section is required".to_string(),
            ));
        }
        if self.window_size == 0 {
            return Err(WaterfallError::InvalidConfig(
                "window_size must be at least 1".to_string(),
            ));
        }
        if self.year_range.min > self.year_range.max {
            return Err(WaterfallError::InvalidConfig(format!(
                "year_range minimum {} exceeds maximum {}",
                self.year_range.min, self.year_range.max
            )));
        }

        let mut seen = std::collections::BTreeSet::new();
        for spec in &self.sections {
            if !seen.insert(spec.label.as_str()) {
                return Err(WaterfallError::InvalidConfig(format!(
                    "duplicate section label '{}'",
                    spec.label
                )));
            }
        }

        let ids = &self.identifiers;
        if ids.entity_id == ids.dimension {
            return Err(WaterfallError::InvalidConfig(
                "entity_id and dimension columns must differ".to_string(),
            ));
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(EngineConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

/// One long-format output row: a single entity/dimension/period observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRecord {
    pub join_key: String,
    pub entity_id: i64,
    pub entity_name: String,
    pub dimension: String,
    pub period: String,
    pub value: CellValue,
}

/// The pivoted output of one metric section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    pub label: String,
    pub metric: String,
    pub records: Vec<PivotRecord>,
}
